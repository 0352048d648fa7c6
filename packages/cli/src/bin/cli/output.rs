// ABOUTME: Terminal rendering helpers shared by the image and container commands
// ABOUTME: Builds comfy-table tables in the rounded UTF-8 style

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use dockhand::{ContainerStatsObservation, DockerContainerStat};

pub fn new_table<I, S>(header: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<comfy_table::Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

pub fn stat_table(stat: &DockerContainerStat) -> Table {
    let mut table = new_table(vec!["CPU", "Memory", "Observed"]);
    table.add_row(vec![
        percent(stat.cpu()),
        percent(stat.memory()),
        stat.observed_at().format("%H:%M:%S").to_string(),
    ]);
    table
}

pub fn observation_table(observation: &ContainerStatsObservation) -> Table {
    let mut table = new_table(vec!["Metric", "Average", "Max"]);
    table.add_row(vec![
        "CPU".to_string(),
        percent(observation.average_cpu()),
        percent(observation.max_cpu()),
    ]);
    table.add_row(vec![
        "Memory".to_string(),
        percent(observation.average_memory()),
        percent(observation.max_memory()),
    ]);
    table
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_percent_formatting() {
        assert_eq!(percent(0.1333333), "0.13%");
        assert_eq!(percent(12.5), "12.50%");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("web", 10), "web");
        assert_eq!(truncate("registry.example.com/team/web", 12), "registry....");
    }

    #[test]
    fn test_observation_table_has_both_metrics() {
        let observation =
            ContainerStatsObservation::from_readings(&[(1.0, 2.0), (3.0, 4.0)]).unwrap();
        let rendered = observation_table(&observation).to_string();

        assert!(rendered.contains("CPU"));
        assert!(rendered.contains("2.00%"));
        assert!(rendered.contains("4.00%"));
    }
}
