use serde::Serialize;

/// Severity bucket for an AQI value, following the US EPA scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollutionTier {
    /// 0 (Good) through 5 (Hazardous).
    pub level: u8,
    pub level_name: &'static str,
    pub implication: &'static str,
}

const TIERS: [PollutionTier; 6] = [
    PollutionTier {
        level: 0,
        level_name: "Good",
        implication: "Air quality is considered satisfactory, and air pollution poses little or no risk.",
    },
    PollutionTier {
        level: 1,
        level_name: "Moderate",
        implication: "Air quality is acceptable; however, for some pollutants there may be a moderate health concern for a very small number of people who are unusually sensitive to air pollution.",
    },
    PollutionTier {
        level: 2,
        level_name: "Unhealthy for Sensitive Groups",
        implication: "Members of sensitive groups may experience health effects. The general public is not likely to be affected.",
    },
    PollutionTier {
        level: 3,
        level_name: "Unhealthy",
        implication: "Everyone may begin to experience health effects; members of sensitive groups may experience more serious health effects.",
    },
    PollutionTier {
        level: 4,
        level_name: "Very Unhealthy",
        implication: "Health warnings of emergency conditions. The entire population is more likely to be affected.",
    },
    PollutionTier {
        level: 5,
        level_name: "Hazardous",
        implication: "Health alert: everyone may experience more serious health effects.",
    },
];

/// Map an AQI value to its tier.
///
/// Every input has a tier: zero and negative values (upstream uses them for
/// "no data") fall into Good, anything above 300 is Hazardous.
pub fn classify(aqi: f64) -> PollutionTier {
    let index = if aqi <= 50.0 {
        0
    } else if aqi <= 100.0 {
        1
    } else if aqi <= 150.0 {
        2
    } else if aqi <= 200.0 {
        3
    } else if aqi <= 300.0 {
        4
    } else {
        5
    };

    TIERS[index].clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0)]
    #[case(50.0, 0)]
    #[case(51.0, 1)]
    #[case(100.0, 1)]
    #[case(101.0, 2)]
    #[case(150.0, 2)]
    #[case(151.0, 3)]
    #[case(200.0, 3)]
    #[case(201.0, 4)]
    #[case(300.0, 4)]
    #[case(301.0, 5)]
    #[case(999.0, 5)]
    fn boundaries(#[case] aqi: f64, #[case] level: u8) {
        assert_eq!(classify(aqi).level, level);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(-500.0)]
    #[case(f64::MIN)]
    fn negative_values_are_good(#[case] aqi: f64) {
        assert_eq!(classify(aqi).level_name, "Good");
    }

    #[test]
    fn fractional_values_past_a_boundary_move_up() {
        assert_eq!(classify(50.5).level, 1);
        assert_eq!(classify(300.1).level, 5);
    }

    #[test]
    fn unhealthy_tier_text() {
        let tier = classify(155.0);
        assert_eq!(tier.level, 3);
        assert_eq!(tier.level_name, "Unhealthy");
        assert_eq!(
            tier.implication,
            "Everyone may begin to experience health effects; members of sensitive groups may experience more serious health effects."
        );
    }

    #[test]
    fn levels_and_names_line_up() {
        let names: Vec<_> = [10.0, 75.0, 125.0, 175.0, 250.0, 400.0]
            .into_iter()
            .map(|aqi| classify(aqi).level_name)
            .collect();

        assert_eq!(
            names,
            [
                "Good",
                "Moderate",
                "Unhealthy for Sensitive Groups",
                "Unhealthy",
                "Very Unhealthy",
                "Hazardous"
            ]
        );
    }
}
