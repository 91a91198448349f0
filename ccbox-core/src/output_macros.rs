//! Themed, non-tracing user output macros shared across all `ccbox` crates.
//!
//! `tracing` events are for structured diagnostics; these macros are for
//! the lines a human running `ccbox` actually reads on their terminal.

#[macro_export]
macro_rules! ccbox_print {
    ($($arg:tt)*) => {
        print!("{}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! ccbox_println {
    () => {
        println!();
    };
    ($($arg:tt)*) => {
        println!("{}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! ccbox_error {
    ($($arg:tt)*) => {
        eprintln!("✗ {}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! ccbox_error_hint {
    ($($arg:tt)*) => {
        eprintln!("  💡 {}", format!($($arg)*));
    };
}

#[macro_export]
macro_rules! ccbox_success {
    ($($arg:tt)*) => {
        eprintln!("✓ {}", format!($($arg)*));
    };
}

#[macro_export]
macro_rules! ccbox_warning {
    ($($arg:tt)*) => {
        eprintln!("⚠ {}", format!($($arg)*));
    };
}

#[macro_export]
macro_rules! ccbox_progress {
    ($($arg:tt)*) => {
        eprintln!("▶ {}", format!($($arg)*));
    };
}

#[macro_export]
macro_rules! ccbox_dbg {
    () => {
        #[cfg(debug_assertions)]
        {
            eprintln!("[{}:{}]", file!(), line!());
        }
    };
    ($val:expr $(,)?) => {{
        #[cfg(debug_assertions)]
        {
            match $val {
                tmp => {
                    eprintln!("[{}:{}] {} = {:#?}",
                        file!(), line!(), stringify!($val), &tmp);
                    tmp
                }
            }
        }
        #[cfg(not(debug_assertions))]
        {
            $val
        }
    }};
    ($($val:expr),+ $(,)?) => {
        ($($crate::ccbox_dbg!($val)),+,)
    };
}
