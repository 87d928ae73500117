use std::{fmt, str::FromStr};

use super::ProtoError;

/// Where the instrument lives.
///
/// Accepts the VISA forms used for these meters (`ASRL3::INSTR`,
/// `TCPIP0::192.168.1.20::5025::SOCKET`) as well as plain serial device
/// names like `/dev/ttyUSB0` or `COM3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Serial(String),
    Socket { host: String, port: u16 },
}

#[cfg(windows)]
fn asrl_path(n: u32) -> String {
    format!("COM{}", n)
}

#[cfg(not(windows))]
fn asrl_path(n: u32) -> String {
    format!("/dev/ttyS{}", n - 1)
}

fn invalid(s: &str, why: &str) -> ProtoError {
    ProtoError::InvalidResource(format!("{}: {}", s, why))
}

impl FromStr for Resource {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(invalid(s, "empty resource name"));
        }
        if !s.contains("::") {
            return Ok(Resource::Serial(s.to_string()));
        }

        let parts: Vec<&str> = s.split("::").collect();
        let interface = parts[0].to_uppercase();

        if let Some(board) = interface.strip_prefix("ASRL") {
            return match parts.as_slice() {
                [_, class] if class.eq_ignore_ascii_case("INSTR") => match board.parse::<u32>() {
                    Ok(n) if n >= 1 => Ok(Resource::Serial(asrl_path(n))),
                    _ => Err(invalid(s, "serial board number must be 1 or greater")),
                },
                _ => Err(invalid(s, "expected ASRL<n>::INSTR")),
            };
        }

        if let Some(board) = interface.strip_prefix("TCPIP") {
            if !board.is_empty() && board.parse::<u32>().is_err() {
                return Err(invalid(s, "bad TCPIP board number"));
            }
            return match parts.as_slice() {
                [_, host, port, class] if class.eq_ignore_ascii_case("SOCKET") => {
                    let port = port
                        .parse::<u16>()
                        .map_err(|_| invalid(s, "bad port number"))?;
                    if host.is_empty() {
                        return Err(invalid(s, "missing host"));
                    }
                    Ok(Resource::Socket {
                        host: host.to_string(),
                        port,
                    })
                }
                _ => Err(invalid(s, "only raw SOCKET resources are supported")),
            };
        }

        Err(invalid(s, "unsupported VISA interface"))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Serial(path) => f.write_str(path),
            Resource::Socket { host, port } => write!(f, "{}:{}", host, port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_device_names() {
        assert_eq!(
            "/dev/ttyUSB0".parse::<Resource>().expect("serial"),
            Resource::Serial(String::from("/dev/ttyUSB0"))
        );
        assert_eq!(
            "COM3".parse::<Resource>().expect("serial"),
            Resource::Serial(String::from("COM3"))
        );
    }

    #[test]
    fn visa_serial() {
        let res = "ASRL3::INSTR".parse::<Resource>().expect("asrl");
        assert_eq!(res, Resource::Serial(asrl_path(3)));
        #[cfg(unix)]
        assert_eq!(res, Resource::Serial(String::from("/dev/ttyS2")));
        assert!("ASRL0::INSTR".parse::<Resource>().is_err());
        assert!("ASRLx::INSTR".parse::<Resource>().is_err());
    }

    #[test]
    fn visa_socket() {
        assert_eq!(
            "TCPIP0::192.168.1.20::5025::SOCKET"
                .parse::<Resource>()
                .expect("socket"),
            Resource::Socket {
                host: String::from("192.168.1.20"),
                port: 5025
            }
        );
        assert!("TCPIP0::192.168.1.20::inst0::INSTR"
            .parse::<Resource>()
            .is_err());
        assert!("TCPIP::host::99999::SOCKET".parse::<Resource>().is_err());
    }

    #[test]
    fn unsupported_interfaces() {
        assert!("USB0::0x1AB1::0x0588::INSTR".parse::<Resource>().is_err());
        assert!("GPIB0::12::INSTR".parse::<Resource>().is_err());
        assert!("".parse::<Resource>().is_err());
    }
}
