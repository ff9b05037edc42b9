use clap::Parser;
use gameplan::stats::Dashboard;
use tracing::instrument;

use super::{Workspace, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Show summary statistics for games and lessons")]
pub struct Stats {
    /// Print JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl Stats {
    #[instrument(level = "debug", skip(workspace))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let session = workspace.open()?;
        let dashboard = Dashboard::compute(session.games.records(), session.lessons.records());

        if self.json {
            Self::output_json(&dashboard)
        } else {
            Self::output_summary(&dashboard);
            Ok(())
        }
    }

    fn output_json(dashboard: &Dashboard) -> anyhow::Result<()> {
        use serde_json::json;

        let positions: Vec<_> = dashboard
            .positions
            .iter()
            .map(|(position, count)| json!({ "position": position, "count": count }))
            .collect();

        let output = json!({
            "total_games": dashboard.total_games,
            "total_lessons": dashboard.total_lessons,
            "average_games_per_lesson": dashboard
                .average_games_per_lesson
                .map(|avg| avg.to_string()),
            "average_duration": dashboard.average_duration,
            "unique_positions": dashboard.unique_positions(),
            "most_used_position": dashboard.most_used_position,
            "positions": positions,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_summary(dashboard: &Dashboard) {
        let average_games = dashboard
            .average_games_per_lesson
            .map_or_else(|| "0".to_string(), |avg| avg.to_string());

        println!("Games                    {}", dashboard.total_games);
        println!("Lessons                  {}", dashboard.total_lessons);
        println!("Games per lesson         {average_games}");
        println!("Average duration (min)   {}", dashboard.average_duration);
        println!("Unique positions         {}", dashboard.unique_positions());
        println!(
            "Most used position       {}",
            dashboard
                .most_used_position
                .as_deref()
                .unwrap_or("N/A")
                .info()
        );

        if !dashboard.positions.is_empty() {
            println!();
            for (position, count) in &dashboard.positions {
                println!("  {position} {}", format!("({count})").dim());
            }
        }
    }
}
