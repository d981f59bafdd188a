pub mod result_detail;
pub mod results;
pub mod subjects;

use ratatui::style::Color;

use crate::scoring::ScoreTier;

pub fn tier_color(tier: ScoreTier) -> Color {
    match tier {
        ScoreTier::Pass => Color::Green,
        ScoreTier::Borderline => Color::Yellow,
        ScoreTier::Fail => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_map_to_traffic_light_colours() {
        assert_eq!(tier_color(ScoreTier::Pass), Color::Green);
        assert_eq!(tier_color(ScoreTier::Borderline), Color::Yellow);
        assert_eq!(tier_color(ScoreTier::Fail), Color::Red);
    }
}
