//! Column roles of the box-score table.
//!
//! Roles are conventions, not a schema: every stage checks for presence before touching a
//! column.

/// Identifier columns, coerced to nullable integers
pub const ID_COLUMNS: &[&str] = &[
    "id",
    "player_id",
    "player_team_id",
    "team_id",
    "game_id",
    "game_home_team_id",
    "game_visitor_team_id",
];

/// Statistic columns, coerced to nullable floats
pub const STAT_COLUMNS: &[&str] = &[
    "fgm", "fga", "fg_pct", "fg3m", "fg3a", "fg3_pct", "ftm", "fta", "ft_pct", "oreb", "dreb",
    "reb", "ast", "stl", "blk", "turnover", "pf", "pts",
];

/// Event counts: a missing value means "did not record", i.e. zero
pub const COUNTING_STATS: &[&str] = &[
    "fgm", "fga", "fg3m", "fg3a", "ftm", "fta", "oreb", "dreb", "reb", "ast", "stl", "blk",
    "turnover", "pf", "pts",
];

pub const TEXT_COLUMNS: &[&str] = &[
    "player_first_name",
    "player_last_name",
    "player_position",
    "team_abbreviation",
    "team_full_name",
];

/// Shot families as `(made, attempted, percentage)`
pub const SHOT_TRIPLES: &[(&str, &str, &str)] = &[
    ("fgm", "fga", "fg_pct"),
    ("fg3m", "fg3a", "fg3_pct"),
    ("ftm", "fta", "ft_pct"),
];

pub const PERCENTAGE_COLUMNS: &[&str] = &["fg_pct", "fg3_pct", "ft_pct"];

/// Columns that get fitted outlier bounds
pub const OUTLIER_COLUMNS: &[&str] = &["pts", "reb", "ast", "minutes_played", "fga", "fg3a"];

/// Abbreviated position codes and their canonical names
pub const POSITION_MAPPING: &[(&str, &str)] = &[
    ("G", "Guard"),
    ("F", "Forward"),
    ("C", "Center"),
    ("G-F", "Guard-Forward"),
    ("F-G", "Guard-Forward"),
    ("F-C", "Forward-Center"),
    ("C-F", "Forward-Center"),
];

/// Text values that mean "no value"
pub const NULL_SENTINELS: &[&str] = &["", "nan", "NaN", "None", "none", "null", "NULL", "N/A"];

pub const RAW_MINUTES: &str = "min";
pub const MINUTES_PLAYED: &str = "minutes_played";
pub const GAME_DATE: &str = "game_date";
pub const GAME_SEASON: &str = "game_season";
pub const GAME_POSTSEASON: &str = "game_postseason";
pub const PLAYER_ID: &str = "player_id";
pub const GAME_ID: &str = "game_id";
pub const FIRST_NAME: &str = "player_first_name";
pub const LAST_NAME: &str = "player_last_name";
pub const FULL_NAME: &str = "player_full_name";
pub const POSITION: &str = "player_position";
pub const POSITION_STANDARDIZED: &str = "player_position_standardized";
pub const REBOUNDS: &str = "reb";
pub const OFFENSIVE_REBOUNDS: &str = "oreb";
pub const DEFENSIVE_REBOUNDS: &str = "dreb";
pub const POINTS: &str = "pts";
pub const ASSISTS: &str = "ast";

/// Suffix of the derived column added by the flag outlier action
pub const OUTLIER_FLAG_SUFFIX: &str = "_outlier_flag";

pub fn is_null_sentinel(value: &str) -> bool {
    NULL_SENTINELS.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(code: &str) -> Option<&'static str> {
        POSITION_MAPPING
            .iter()
            .find(|(abbrev, _)| *abbrev == code)
            .map(|(_, full)| *full)
    }

    #[test]
    fn test_compound_positions_collapse() {
        assert_eq!(position("G-F"), position("F-G"));
        assert_eq!(position("F-C"), position("C-F"));
        assert_eq!(position("G-F"), Some("Guard-Forward"));
        assert_eq!(position("PG"), None);
    }

    #[test]
    fn test_counting_stats_are_stat_columns() {
        for col in COUNTING_STATS {
            assert!(STAT_COLUMNS.contains(col), "{col} is not a stat column");
        }
    }
}
