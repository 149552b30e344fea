use crate::config::{Parity, SerialConfig};
use std::collections::HashMap;

/// Iskra MT382 (DSMR 2.2): 9600 baud, 7E1
pub fn get_iskra_mt382_definition() -> SerialConfig {
    SerialConfig {
        port: "/dev/ttyUSB0".to_string(),
        baudrate: 9600,
        bytesize: 7,
        parity: Parity::E,
        stopbits: 1,
        xonxoff: false,
        rtscts: false,
        timeout: 20,
    }
}

/// DSMR 4.x and 5.x meters: 115200 baud, 8N1
pub fn get_dsmr4_definition() -> SerialConfig {
    SerialConfig {
        port: "/dev/ttyUSB0".to_string(),
        baudrate: 115200,
        bytesize: 8,
        parity: Parity::N,
        stopbits: 1,
        xonxoff: false,
        rtscts: false,
        timeout: 20,
    }
}

pub fn get_meter_template(name: &str) -> Option<SerialConfig> {
    match name.to_lowercase().replace('-', "_").as_str() {
        "iskra_mt382" | "dsmr2" => Some(get_iskra_mt382_definition()),
        "dsmr4" | "dsmr5" => Some(get_dsmr4_definition()),
        _ => None,
    }
}

pub fn create_example_telegrams() -> HashMap<String, String> {
    let mut examples = HashMap::new();

    // Iskra MT382, DSMR 2.2
    let iskra_telegram = r"/ISk5\2MT382-1000

0-0:96.1.1(4B413650303035303030303030303030)
1-0:1.8.1(00187.472*kWh)
1-0:1.8.2(00120.381*kWh)
1-0:2.8.1(00000.000*kWh)
1-0:2.8.2(00000.000*kWh)
0-0:96.14.0(0002)
1-0:1.7.0(0000.45*kW)
1-0:2.7.0(0000.00*kW)
0-0:17.0.0(999*A)
0-0:96.3.10(1)
0-0:96.13.1()
0-0:96.13.0()
0-1:24.1.0(3)
0-1:96.1.0(3238313031453631373038393930373037)
0-1:24.3.0(121030140000)(00)(60)(1)(0-1:24.2.1)(m3)
(00000.000)
0-1:24.4.0(1)
!";
    examples.insert("Iskra_MT382".to_string(), iskra_telegram.to_string());

    // Kaifa MA105, DSMR 4.0
    let kaifa_telegram = r"/KFM5KAIFA-METER

1-3:0.2.8(42)
0-0:1.0.0(161113205757W)
0-0:96.1.1(3960221976967177082151037881335713)
1-0:1.8.1(001581.123*kWh)
1-0:1.8.2(001435.706*kWh)
1-0:2.8.1(000000.000*kWh)
1-0:2.8.2(000000.000*kWh)
0-0:96.14.0(0002)
1-0:1.7.0(02.027*kW)
1-0:2.7.0(00.000*kW)
0-0:96.7.21(00015)
1-0:32.7.0(236.0*V)
0-0:96.13.1()
0-0:96.13.0()
!E5F1";
    examples.insert("Kaifa_MA105".to_string(), kaifa_telegram.to_string());

    examples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iskra_definition() {
        let definition = get_iskra_mt382_definition();
        assert_eq!(definition.baudrate, 9600);
        assert_eq!(definition.bytesize, 7);
        assert_eq!(definition.parity, Parity::E);
        assert!(definition.validate().is_ok());
    }

    #[test]
    fn test_dsmr4_definition() {
        let definition = get_dsmr4_definition();
        assert_eq!(definition.baudrate, 115200);
        assert_eq!(definition.parity, Parity::N);
        assert!(definition.validate().is_ok());
    }

    #[test]
    fn test_get_meter_template() {
        assert!(get_meter_template("iskra_mt382").is_some());
        assert!(get_meter_template("Iskra-MT382").is_some());
        assert_eq!(get_meter_template("dsmr5").unwrap().baudrate, 115200);
        assert!(get_meter_template("unknown").is_none());
    }

    #[test]
    fn test_example_telegrams() {
        let examples = create_example_telegrams();
        assert!(examples["Iskra_MT382"].starts_with("/ISk5\\"));
        assert!(examples["Kaifa_MA105"].starts_with("/KFM5"));
        assert!(examples.values().all(|t| t.lines().last().unwrap().starts_with('!')));
    }
}
