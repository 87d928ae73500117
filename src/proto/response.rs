use std::fmt;

use super::ProtoError;

/// Reply to `*IDN?`: `manufacturer,model,serial,firmware`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ident {
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub firmware: String,
}

impl TryFrom<&str> for Ident {
    type Error = ProtoError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let values: Vec<&str> = value.splitn(4, ',').map(str::trim).collect();
        if values.len() >= 2 && !values[0].is_empty() {
            let field = |i: usize| values.get(i).copied().unwrap_or_default().to_string();
            Ok(Self {
                manufacturer: field(0),
                model: field(1),
                serial: field(2),
                firmware: field(3),
            })
        } else {
            Err(ProtoError::Malformed(format!(
                "Invalid data for ID response: {}",
                value
            )))
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.manufacturer, self.model)?;
        if !self.serial.is_empty() {
            write!(f, " (serial {})", self.serial)?;
        }
        if !self.firmware.is_empty() {
            write!(f, " firmware {}", self.firmware)?;
        }
        Ok(())
    }
}

/// On/off state replies, e.g. `BEEP:STAT?`.
pub(crate) fn parse_switch(text: &str) -> Result<bool, ProtoError> {
    match text.trim().to_uppercase().as_str() {
        "ON" | "1" => Ok(true),
        "OFF" | "0" => Ok(false),
        _ => Err(ProtoError::Malformed(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_full() {
        let id = Ident::try_from("OWON,XDM1041,2147483,V3.7.2,1").expect("ident");
        assert_eq!(id.manufacturer, "OWON");
        assert_eq!(id.model, "XDM1041");
        assert_eq!(id.serial, "2147483");
        assert_eq!(id.firmware, "V3.7.2,1");
    }

    #[test]
    fn ident_partial() {
        let id = Ident::try_from("OWON, XDM1141").expect("ident");
        assert_eq!(id.model, "XDM1141");
        assert!(id.serial.is_empty());
        assert_eq!(id.to_string(), "OWON XDM1141");
    }

    #[test]
    fn ident_garbage() {
        assert!(Ident::try_from("").is_err());
        assert!(Ident::try_from("1.234V").is_err());
    }

    #[test]
    fn switch_states() {
        assert!(parse_switch("ON").expect("on"));
        assert!(parse_switch("1").expect("on"));
        assert!(!parse_switch("off").expect("off"));
        assert!(parse_switch("MAYBE").is_err());
    }
}
