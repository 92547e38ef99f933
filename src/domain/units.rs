// Unit normalization into mass concentration (µg/m³)
//
// ppm/ppb conversions use `molecular_weight * factor`. The default factors (40.9 and 0.0409)
// are 1000/24.45 and 1/24.45, i.e. the molar volume of an ideal gas at roughly 25 °C and
// 1 atm. They are an approximation and are configurable.
use super::error::AggregationError;
use super::reading::NormalizedPollutant;

pub const MICROGRAMS_PER_CUBIC_METER: &str = "µg/m³";
pub const DEFAULT_PPM_FACTOR: f64 = 40.9;
pub const DEFAULT_PPB_FACTOR: f64 = 0.0409;

/// Molecular weights in g/mol for gases that can be converted from mixing ratios.
const MOLECULAR_WEIGHTS: &[(&str, f64)] = &[
    ("CO", 28.01),
    ("NO2", 46.01),
    ("O3", 48.00),
    ("SO2", 64.07),
];

/// Parameters that are not concentrations at all.
const NON_MASS_PARAMETERS: &[&str] = &[
    "TEMPERATURE",
    "RELATIVEHUMIDITY",
    "RELATIVE_HUMIDITY",
    "HUMIDITY",
    "PRESSURE",
    "WIND_SPEED",
    "WIND_DIRECTION",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionFactors {
    pub ppm_factor: f64,
    pub ppb_factor: f64,
}

impl Default for ConversionFactors {
    fn default() -> Self {
        Self {
            ppm_factor: DEFAULT_PPM_FACTOR,
            ppb_factor: DEFAULT_PPB_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SourceUnit {
    MicrogramsPerCubicMeter,
    MilligramsPerCubicMeter,
    Ppm,
    Ppb,
}

impl SourceUnit {
    fn parse(unit: &str) -> Option<Self> {
        let key: String = unit
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                'µ' | 'μ' => 'u',
                '³' => '3',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        match key.as_str() {
            "ug/m3" | "mcg/m3" => Some(SourceUnit::MicrogramsPerCubicMeter),
            "mg/m3" => Some(SourceUnit::MilligramsPerCubicMeter),
            "ppm" => Some(SourceUnit::Ppm),
            "ppb" => Some(SourceUnit::Ppb),
            _ => None,
        }
    }
}

/// Upper-case a parameter name and fold the PM2.5 spellings into "PM25".
pub fn canonical_parameter(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    match upper.as_str() {
        "PM2.5" | "PM2_5" => "PM25".to_string(),
        _ => upper,
    }
}

pub fn molecular_weight(parameter: &str) -> Option<f64> {
    MOLECULAR_WEIGHTS
        .iter()
        .find(|(name, _)| *name == parameter)
        .map(|(_, weight)| *weight)
}

pub fn is_non_mass(parameter: &str) -> bool {
    // UM003, UM005, ... are particle counts per volume
    NON_MASS_PARAMETERS.contains(&parameter)
        || (parameter.len() > 2
            && parameter.starts_with("UM")
            && parameter[2..].chars().all(|c| c.is_ascii_digit()))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnitNormalizer {
    factors: ConversionFactors,
}

impl UnitNormalizer {
    pub fn new(factors: ConversionFactors) -> Self {
        Self { factors }
    }

    pub fn normalize(
        &self,
        value: Option<f64>,
        unit: Option<&str>,
        parameter: Option<&str>,
    ) -> Result<NormalizedPollutant, AggregationError> {
        let parameter_name = match parameter.map(canonical_parameter) {
            Some(p) if !p.is_empty() => p,
            _ => return Err(AggregationError::unconvertible(parameter, unit, "missing parameter")),
        };
        let value = match value {
            Some(v) if v.is_finite() => v,
            _ => {
                return Err(AggregationError::unconvertible(
                    Some(&parameter_name),
                    unit,
                    "missing value",
                ));
            }
        };

        if is_non_mass(&parameter_name) {
            return Ok(NormalizedPollutant {
                parameter_name,
                value,
                unit: unit.unwrap_or_default().to_string(),
            });
        }

        let unit = match unit.map(str::trim) {
            Some(u) if !u.is_empty() => u,
            _ => {
                return Err(AggregationError::unconvertible(
                    Some(&parameter_name),
                    None,
                    "missing unit",
                ));
            }
        };
        let source_unit = SourceUnit::parse(unit).ok_or_else(|| {
            AggregationError::unconvertible(Some(&parameter_name), Some(unit), "unknown unit")
        })?;

        let converted = match source_unit {
            SourceUnit::MicrogramsPerCubicMeter => value,
            SourceUnit::MilligramsPerCubicMeter => value * 1000.0,
            SourceUnit::Ppm | SourceUnit::Ppb => {
                let weight = molecular_weight(&parameter_name).ok_or_else(|| {
                    AggregationError::unconvertible(
                        Some(&parameter_name),
                        Some(unit),
                        "no molecular weight for mixing ratio",
                    )
                })?;
                let factor = if source_unit == SourceUnit::Ppm {
                    self.factors.ppm_factor
                } else {
                    self.factors.ppb_factor
                };
                value * weight * factor
            }
        };

        Ok(NormalizedPollutant {
            parameter_name,
            value: converted,
            unit: MICROGRAMS_PER_CUBIC_METER.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn normalize(
        value: f64,
        unit: &str,
        parameter: &str,
    ) -> Result<NormalizedPollutant, AggregationError> {
        UnitNormalizer::default().normalize(Some(value), Some(unit), Some(parameter))
    }

    #[test]
    fn test_canonical_units_are_unchanged() {
        for unit in ["µg/m³", "μg/m³", "ug/m3", "µg/m3", "UG/M3", "ug / m³"] {
            let p = normalize(17.25, unit, "pm25").unwrap();
            assert_eq!(p.parameter_name, "PM25");
            assert!((p.value - 17.25).abs() < TOLERANCE, "unit {}", unit);
            assert_eq!(p.unit, MICROGRAMS_PER_CUBIC_METER);

            // Normalizing the output again is a no-op
            let again = normalize(p.value, &p.unit, &p.parameter_name).unwrap();
            assert!((again.value - p.value).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_milligrams_scale_by_thousand() {
        let p = normalize(0.5, "mg/m³", "PM10").unwrap();
        assert!((p.value - 500.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_co_ppm_uses_molecular_weight() {
        let p = normalize(1.2, "ppm", "co").unwrap();
        assert!((p.value - 1.2 * 28.01 * 40.9).abs() < 1e-6);
        assert_eq!(p.unit, MICROGRAMS_PER_CUBIC_METER);
    }

    #[test]
    fn test_o3_ppb_uses_molecular_weight() {
        let p = normalize(50.0, "ppb", "O3").unwrap();
        assert!((p.value - 50.0 * 48.00 * 0.0409).abs() < 1e-6);
    }

    #[test]
    fn test_factors_are_configurable() {
        // 20 °C reference instead of 25 °C
        let normalizer = UnitNormalizer::new(ConversionFactors {
            ppm_factor: 41.57,
            ppb_factor: 0.04157,
        });
        let p = normalizer.normalize(Some(10.0), Some("ppb"), Some("NO2")).unwrap();
        assert!((p.value - 10.0 * 46.01 * 0.04157).abs() < 1e-6);
    }

    #[test]
    fn test_non_mass_parameters_pass_through() {
        for unit in ["c", "µg/m³", "ppm", "whatever"] {
            let p = normalize(21.5, unit, "TEMPERATURE").unwrap();
            assert_eq!(p.value, 21.5);
            assert_eq!(p.unit, unit);
        }

        let p = normalize(63.0, "%", "relativehumidity").unwrap();
        assert_eq!(p.unit, "%");

        let p = normalize(1200.0, "particles/cm³", "um003").unwrap();
        assert_eq!(p.value, 1200.0);

        let p = UnitNormalizer::default()
            .normalize(Some(1013.0), None, Some("pressure"))
            .unwrap();
        assert_eq!(p.unit, "");
    }

    #[test]
    fn test_unconvertible_cases() {
        let n = UnitNormalizer::default();
        assert!(matches!(
            n.normalize(None, Some("ppm"), Some("CO")),
            Err(AggregationError::Unconvertible { .. })
        ));
        assert!(n.normalize(Some(f64::NAN), Some("ppm"), Some("CO")).is_err());
        assert!(n.normalize(Some(1.0), None, Some("CO")).is_err());
        assert!(n.normalize(Some(1.0), Some("ppm"), None).is_err());
        assert!(n.normalize(Some(1.0), Some("ppm"), Some("  ")).is_err());
        // Particulates have no molecular weight
        assert!(n.normalize(Some(1.0), Some("ppm"), Some("PM25")).is_err());
        // Gas without a table entry
        assert!(n.normalize(Some(400.0), Some("ppm"), Some("CO2")).is_err());
        assert!(n.normalize(Some(1.0), Some("furlongs"), Some("NO2")).is_err());
    }

    #[test]
    fn test_canonical_parameter_aliases() {
        assert_eq!(canonical_parameter("pm2.5"), "PM25");
        assert_eq!(canonical_parameter("PM2_5"), "PM25");
        assert_eq!(canonical_parameter(" no2 "), "NO2");
        assert!(is_non_mass("UM010"));
        assert!(!is_non_mass("UMBRELLA"));
        assert_eq!(molecular_weight("SO2"), Some(64.07));
        assert_eq!(molecular_weight("PM10"), None);
    }
}
