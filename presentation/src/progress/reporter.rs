//! Progress reporting for pipeline execution

use colored::Colorize;
use courier_application::PipelineProgress;
use courier_domain::PipelineStage;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress during query processing with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    stage_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            stage_bar: Mutex::new(None),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn stage_display_name(stage: &PipelineStage) -> &'static str {
        match stage {
            PipelineStage::Decompose => "Stage 1: Planning",
            PipelineStage::Execute => "Stage 2: Gathering",
            PipelineStage::Synthesize => "Stage 3: Answering",
        }
    }

    fn stage_short_name(stage: &PipelineStage) -> &'static str {
        match stage {
            PipelineStage::Decompose => "Planning",
            PipelineStage::Execute => "Gathering",
            PipelineStage::Synthesize => "Answering",
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineProgress for ProgressReporter {
    fn on_stage_start(&self, stage: &PipelineStage, total_units: usize) {
        let pb = self.multi.add(ProgressBar::new(total_units as u64));
        pb.set_style(Self::stage_style());
        pb.set_prefix(Self::stage_display_name(stage));
        pb.set_message("starting...");

        if let Ok(mut bar) = self.stage_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_group_start(&self, group: u32, nodes: usize) {
        if let Ok(bar) = self.stage_bar.lock() {
            if let Some(pb) = bar.as_ref() {
                pb.set_message(format!("group {group} ({nodes} steps)"));
            }
        }
    }

    fn on_node_complete(&self, node_id: &str, success: bool) {
        if let Ok(bar) = self.stage_bar.lock() {
            if let Some(pb) = bar.as_ref() {
                let status = if success {
                    format!("{} {}", "v".green(), node_id)
                } else {
                    format!("{} {}", "x".red(), node_id)
                };
                pb.set_message(status);
                pb.inc(1);
            }
        }
    }

    fn on_stage_complete(&self, stage: &PipelineStage) {
        if let Ok(mut bar) = self.stage_bar.lock() {
            if let Some(pb) = bar.take() {
                pb.finish_with_message(format!(
                    "{} done",
                    Self::stage_short_name(stage).green()
                ));
            }
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl PipelineProgress for SimpleProgress {
    fn on_stage_start(&self, stage: &PipelineStage, total_units: usize) {
        println!(
            "{} {} ({} steps)",
            "->".cyan(),
            ProgressReporter::stage_display_name(stage).bold(),
            total_units
        );
    }

    fn on_node_complete(&self, node_id: &str, success: bool) {
        if success {
            println!("  {} {}", "v".green(), node_id);
        } else {
            println!("  {} {} (failed)", "x".red(), node_id);
        }
    }

    fn on_stage_complete(&self, _stage: &PipelineStage) {
        println!();
    }
}
