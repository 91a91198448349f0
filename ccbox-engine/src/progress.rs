//! Build-progress rendering for `image_build`, grounded in the teacher's
//! `DockerProgressParser` (step counter + per-layer spinners), retargeted
//! at the core crate's [`ProgressParser`] seam instead of a locally
//! redefined trait.

use ccbox_core::command_stream::ProgressParser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

pub struct DockerProgressParser {
    mp: Arc<MultiProgress>,
    main_bar: ProgressBar,
    step_regex: Regex,
    layer_pull_regex: Regex,
    total_steps: u32,
    layer_bars: HashMap<String, ProgressBar>,
}

impl DockerProgressParser {
    pub fn new() -> Self {
        let mp = Arc::new(MultiProgress::new());
        let main_bar = mp.add(ProgressBar::new(0));
        main_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        Self {
            mp,
            main_bar,
            step_regex: Regex::new(r"Step (\d+)/(\d+)").expect("static pattern"),
            layer_pull_regex: Regex::new(r"([a-f0-9]{12}): Pulling fs layer").expect("static pattern"),
            total_steps: 0,
            layer_bars: HashMap::new(),
        }
    }
}

impl Default for DockerProgressParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressParser for DockerProgressParser {
    fn parse_line(&mut self, line: &str) {
        if let Some(caps) = self.step_regex.captures(line) {
            let step: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            let total: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            if self.total_steps == 0 {
                self.total_steps = total;
                self.main_bar.set_length(self.total_steps as u64);
            }
            self.main_bar.set_position(step as u64);
            self.main_bar.set_message(line.trim().to_string());
        }

        if let Some(caps) = self.layer_pull_regex.captures(line) {
            if let Some(layer_id_match) = caps.get(1) {
                let layer_id = layer_id_match.as_str().to_string();
                self.layer_bars.entry(layer_id.clone()).or_insert_with(|| {
                    let pb = self.mp.add(ProgressBar::new_spinner());
                    pb.set_style(
                        ProgressStyle::default_spinner()
                            .template("  {prefix:12} {spinner} {wide_msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                    );
                    pb.set_prefix(layer_id);
                    pb.set_message("Pulling...");
                    pb
                });
            }
        }
    }

    fn finish(&self) {
        self.main_bar.finish_with_message("Build complete");
        for bar in self.layer_bars.values() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_line_advances_main_bar() {
        let mut parser = DockerProgressParser::new();
        parser.parse_line("Step 2/5 : RUN echo hi");
        assert_eq!(parser.main_bar.position(), 2);
        assert_eq!(parser.main_bar.length(), Some(5));
    }

    #[test]
    fn layer_pull_line_creates_one_bar_per_layer() {
        let mut parser = DockerProgressParser::new();
        parser.parse_line("a1b2c3d4e5f6: Pulling fs layer");
        parser.parse_line("a1b2c3d4e5f6: Pulling fs layer");
        assert_eq!(parser.layer_bars.len(), 1);
    }
}
