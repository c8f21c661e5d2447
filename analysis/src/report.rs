use crate::Analysis;
use harvester_core::CoreError;
use std::path::Path;
use tracing::info;

const RULE_WIDTH: usize = 50;

pub fn render_report(analysis: &Analysis) -> String {
    let mut out = String::from("FULL DATASET ANALYSIS REPORT\n");
    out.push_str(&format!(
        "Total Records Analyzed: {}\n",
        analysis.total_records
    ));
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push_str("\n\n");

    out.push_str("### 1. Most Active Communities (Subreddits)\n");
    out.push_str("Where are people asking for things most often?\n\n");
    out.push_str("| Rank | Subreddit | Count | Total Score |\n");
    out.push_str("|---|---|---|---|\n");
    for (rank, stats) in analysis.communities.iter().enumerate() {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            rank + 1,
            stats.subreddit,
            stats.count,
            stats.total_score
        ));
    }

    out.push_str("\n### 2. Top Keywords (Hot Topics)\n");
    out.push_str(
        "Most frequent words in titles and descriptions (excluding common words):\n\n",
    );
    for (rank, keyword) in analysis.keywords.iter().enumerate() {
        out.push_str(&format!("{}. {} ({})\n", rank + 1, keyword.word, keyword.count));
    }

    out.push_str("\n### 3. Categories\n");
    out.push_str("How many posts fall into each category:\n\n");
    out.push_str("| Category | Count |\n");
    out.push_str("|---|---|\n");
    for category in &analysis.categories {
        out.push_str(&format!("| {} | {} |\n", category.category, category.count));
    }

    out
}

/// Renders the report and replaces whatever is at `path`.
pub async fn write_report(analysis: &Analysis, path: &Path) -> Result<(), CoreError> {
    let content = render_report(analysis);
    tokio::fs::write(path, content).await?;
    info!("Analysis saved to {}", path.display());
    Ok(())
}
