use indicatif::{ProgressBar, ProgressStyle};

// ── Progress helpers ──────────────────────────────────────────────────────────
// Every helper returns `None` when progress is hidden so callers can thread an
// `Option<ProgressBar>` through without branching on the flag again.

pub fn make_spinner(show: bool, msg: &str) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

pub fn make_progress(show: bool, total: u64, msg: &str) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━░"),
    );
    pb.set_message(msg.to_string());
    Some(pb)
}

pub fn tick(pb: &Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.inc(1);
    }
}

pub fn set_message(pb: &Option<ProgressBar>, msg: String) {
    if let Some(pb) = pb {
        pb.set_message(msg);
    }
}

pub fn finish(pb: Option<ProgressBar>, msg: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(msg.to_string());
    }
}

pub fn clear(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}
