/// One actionable tip surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    pub text: &'static str,
    pub action: &'static str,
}

/// Cached usage percentages a rule is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct Readings {
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub disk_percent: f64,
}

/// A fixed advisory rule. Lower priority numbers are more urgent.
struct Rule {
    applies: fn(&Readings) -> bool,
    text: &'static str,
    action: &'static str,
    priority: u8,
}

const MAX_RECOMMENDATIONS: usize = 3;
const GENERIC_TIP_COUNT: usize = 2;

static RULES: [Rule; 5] = [
    Rule {
        applies: |r| r.disk_percent > 95.0,
        text: "Low disk space",
        action: "Clean temporary files",
        priority: 1,
    },
    Rule {
        applies: |r| r.disk_percent > 85.0,
        text: "Low free space",
        action: "Free up disk space",
        priority: 2,
    },
    Rule {
        applies: |r| r.ram_percent > 85.0,
        text: "High memory usage",
        action: "Close unnecessary applications",
        priority: 2,
    },
    Rule {
        applies: |r| r.cpu_percent > 90.0,
        text: "High CPU load",
        action: "Check background processes",
        priority: 2,
    },
    Rule {
        applies: |r| r.ram_percent > 75.0,
        text: "High RAM usage",
        action: "Close background applications",
        priority: 3,
    },
];

/// Shown when no rule matches.
static GENERIC_TIPS: [Recommendation; 3] = [
    Recommendation {
        text: "System optimization",
        action: "Regularly clean temporary files",
    },
    Recommendation {
        text: "Performance",
        action: "Close unused programs",
    },
    Recommendation {
        text: "Maintenance",
        action: "Check disk for errors monthly",
    },
];

/// Evaluate every rule against the readings and return at most three tips,
/// most urgent first. With nothing to report, the first two generic
/// maintenance tips stand in.
pub fn evaluate(readings: &Readings) -> Vec<Recommendation> {
    let mut matched: Vec<&Rule> = RULES
        .iter()
        .filter(|rule| (rule.applies)(readings))
        .collect();

    if matched.is_empty() {
        return GENERIC_TIPS[..GENERIC_TIP_COUNT].to_vec();
    }

    // Stable sort: rules of equal priority keep their declaration order.
    matched.sort_by_key(|rule| rule.priority);
    matched
        .iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|rule| Recommendation {
            text: rule.text,
            action: rule.action,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(cpu: f64, ram: f64, disk: f64) -> Readings {
        Readings {
            cpu_percent: cpu,
            ram_percent: ram,
            disk_percent: disk,
        }
    }

    #[test]
    fn critical_disk_wins_alone() {
        let tips = evaluate(&readings(50.0, 50.0, 96.0));

        // disk > 95 and disk > 85 both match; the priority-1 tip leads.
        assert_eq!(tips[0].text, "Low disk space");
        assert_eq!(tips[0].action, "Clean temporary files");
        assert_eq!(tips.len(), 2);
        assert_eq!(tips[1].text, "Low free space");
    }

    #[test]
    fn quiet_system_gets_two_generic_tips() {
        let tips = evaluate(&readings(10.0, 10.0, 10.0));

        assert_eq!(tips.len(), 2);
        assert_eq!(tips[0], GENERIC_TIPS[0]);
        assert_eq!(tips[1], GENERIC_TIPS[1]);
    }

    #[test]
    fn at_most_three_tips_ordered_by_priority() {
        // disk>85, ram>85, cpu>90 and ram>75 all match.
        let tips = evaluate(&readings(95.0, 90.0, 90.0));

        assert_eq!(tips.len(), 3);
        assert_eq!(tips[0].text, "Low free space");
        assert_eq!(tips[1].text, "High memory usage");
        assert_eq!(tips[2].text, "High CPU load");
    }

    #[test]
    fn thresholds_are_exclusive() {
        // Exactly at a threshold, the rule does not fire.
        let tips = evaluate(&readings(90.0, 75.0, 85.0));
        assert_eq!(tips.len(), GENERIC_TIP_COUNT);
    }

    #[test]
    fn medium_ram_alone_fires_lowest_priority_rule() {
        let tips = evaluate(&readings(10.0, 80.0, 10.0));

        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].text, "High RAM usage");
    }
}
