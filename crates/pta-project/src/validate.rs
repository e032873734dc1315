//! Settings validation.
//!
//! Only values that are present are checked here. Values a run needs but a
//! draft may omit (project name, convection parameters) are reported by the
//! run preconditions instead.

use crate::schema::{ConvectionDef, LATEST_VERSION, MAX_PROCESSORS, MIN_PROCESSORS, SimulationSettings};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Letters, digits and underscores only.
pub fn is_valid_project_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_settings(settings: &SimulationSettings) -> Result<(), ValidationError> {
    if settings.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: settings.version,
        });
    }

    if !settings.project_name.is_empty() && !is_valid_project_name(&settings.project_name) {
        return Err(invalid(
            "project_name",
            &settings.project_name,
            "only letters, digits and underscores are allowed",
        ));
    }

    if !(MIN_PROCESSORS..=MAX_PROCESSORS).contains(&settings.processors) {
        return Err(invalid(
            "processors",
            settings.processors,
            "must be between 1 and 128",
        ));
    }

    let release = settings.normalized_release();
    let well_formed = release
        .split_once('.')
        .is_some_and(|(year, rev)| {
            year.len() == 4
                && year.chars().all(|c| c.is_ascii_digit())
                && !rev.is_empty()
                && rev.chars().all(|c| c.is_ascii_digit())
        });
    if !well_formed {
        return Err(invalid("release", &settings.release, "expected e.g. `2023 R1`"));
    }

    if let Some(convection) = &settings.convection {
        validate_convection(convection)?;
    }

    Ok(())
}

fn validate_convection(convection: &ConvectionDef) -> Result<(), ValidationError> {
    if let ConvectionDef::Forced {
        speed_m_s: Some(speed),
        ..
    } = convection
        && (!speed.is_finite() || *speed <= 0.0)
    {
        return Err(invalid("speed_m_s", speed, "must be a finite positive number"));
    }
    if let Some(t) = convection.air_temperature_c() {
        // below absolute zero is never a valid air temperature
        if !t.is_finite() || t < -273.15 {
            return Err(invalid("air temperature", t, "must be a finite temperature in °C"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use pta_core::Direction;

    #[test]
    fn template_is_valid() {
        validate_settings(&SimulationSettings::template("Board_01")).unwrap();
    }

    #[test]
    fn project_name_characters() {
        assert!(is_valid_project_name("Board_01"));
        assert!(!is_valid_project_name("board-01"));
        assert!(!is_valid_project_name("my board"));
        let s = SimulationSettings::template("bad name");
        assert!(validate_settings(&s).is_err());
        // a draft without a name is still a valid file
        let s = SimulationSettings::template("");
        assert!(validate_settings(&s).is_ok());
    }

    #[test]
    fn processor_range() {
        let mut s = SimulationSettings::template("p");
        s.processors = 0;
        assert!(validate_settings(&s).is_err());
        s.processors = 128;
        assert!(validate_settings(&s).is_ok());
        s.processors = 129;
        assert!(validate_settings(&s).is_err());
    }

    #[test]
    fn convection_values() {
        let mut s = SimulationSettings::template("p");
        s.convection = Some(ConvectionDef::Forced {
            direction: Direction::NegY,
            speed_m_s: Some(0.0),
            inlet_temperature_c: Some(25.0),
        });
        assert!(validate_settings(&s).is_err());
        s.convection = Some(ConvectionDef::Natural {
            gravity: Direction::NegZ,
            ambient_temperature_c: Some(f64::NAN),
        });
        assert!(validate_settings(&s).is_err());
        s.convection = Some(ConvectionDef::Natural {
            gravity: Direction::NegZ,
            ambient_temperature_c: None,
        });
        assert!(validate_settings(&s).is_ok());
    }

    #[test]
    fn release_format() {
        let mut s = SimulationSettings::template("p");
        s.release = "latest".into();
        assert!(validate_settings(&s).is_err());
        s.release = "2023 R2".into();
        assert!(validate_settings(&s).is_ok());
    }

    proptest! {
        #[test]
        fn word_characters_are_accepted(name in "[A-Za-z0-9_]{1,24}") {
            prop_assert!(is_valid_project_name(&name));
        }

        #[test]
        fn other_characters_are_rejected(
            head in "[A-Za-z0-9_]{0,8}",
            bad in "[- .#/]",
            tail in "[A-Za-z0-9_]{0,8}",
        ) {
            let name = format!("{head}{bad}{tail}");
            prop_assert!(!is_valid_project_name(&name));
        }
    }
}
