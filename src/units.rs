pub mod temperature {
    pub fn c2f(temp_c: f64) -> f64 {
        temp_c * 9.0 / 5.0 + 32.0
    }

    #[test]
    fn test_temperature() {
        assert_eq!(c2f(0.0), 32.0);
        assert_eq!(c2f(100.0), 212.0);
        assert_eq!(c2f(-40.0), -40.0);
    }
}

/// Display units for temperatures. Forecasts are always fetched in Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn format(self, temp_c: f64) -> String {
        match self {
            Units::Metric => format!("{temp_c}°C"),
            Units::Imperial => {
                let temp_f = (temperature::c2f(temp_c) * 10.0).round() / 10.0;
                format!("{temp_f}°F")
            }
        }
    }
}

#[test]
fn test_format() {
    assert_eq!(Units::Metric.format(5.0), "5°C");
    assert_eq!(Units::Metric.format(-1.5), "-1.5°C");
    assert_eq!(Units::Imperial.format(5.0), "41°F");
    assert_eq!(Units::Imperial.format(-1.0), "30.2°F");
}
