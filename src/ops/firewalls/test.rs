use super::*;
use crate::api::fixtures::FakeApi;
use crate::dispatch::{FailureInfo, FailureKind};

pub mod fixtures {
    // Four registrations: two connected, one disconnected, one re-registered serial, and one
    // with most fields missing.
    pub const DEVICES: &str = r#"<response status="success"><result><devices>
        <entry name="001801000001">
            <serial>001801000001</serial>
            <connected>yes</connected>
            <hostname>FW-B</hostname>
            <ip-address>10.0.0.2</ip-address>
            <model>PA-3220</model>
            <sw-version>10.1.6</sw-version>
            <uptime>12 days, 01:02:03</uptime>
        </entry>
        <entry name="001801000002">
            <serial>001801000002</serial>
            <connected>no</connected>
            <hostname>FW-C</hostname>
            <ip-address>10.0.0.3</ip-address>
            <model>PA-220</model>
        </entry>
        <entry name="001801000003">
            <serial>001801000003</serial>
            <connected>yes</connected>
            <hostname>FW-A</hostname>
            <ip-address>10.0.0.1</ip-address>
            <model>PA-5220</model>
            <sw-version>10.2.3</sw-version>
            <uptime>3 days, 04:05:06</uptime>
        </entry>
        <entry name="001801000004">
            <serial>001801000004</serial>
            <connected>no</connected>
        </entry>
        <entry name="001801000002">
            <serial>001801000002</serial>
            <connected>no</connected>
            <hostname>FW-C</hostname>
            <ip-address>10.0.0.33</ip-address>
            <model>PA-220</model>
        </entry>
    </devices></result></response>"#;
}
use fixtures::*;

fn hostnames(firewalls: &[Firewall]) -> Vec<&str> {
    firewalls.iter().map(|fw| fw.hostname.as_str()).collect()
}

mod parse_devices {
    use super::*;

    #[test]
    fn sorts_by_hostname_with_unnamed_devices_last() {
        let firewalls = parse_devices(DEVICES, &DeviceFilter::default()).unwrap();
        assert_eq!(vec!["fw-a", "fw-b", "fw-c", "n/a"], hostnames(&firewalls));
    }

    #[test]
    fn keeps_the_last_entry_for_a_serial() {
        let firewalls = parse_devices(DEVICES, &DeviceFilter::default()).unwrap();
        let fw_c: Vec<_> = firewalls.iter().filter(|fw| fw.hostname == "fw-c").collect();
        assert_eq!(1, fw_c.len());
        assert_eq!("10.0.0.33", fw_c[0].mgmt_ip);
    }

    #[test]
    fn fills_missing_fields() {
        let firewalls = parse_devices(DEVICES, &DeviceFilter::default()).unwrap();
        assert_eq!(
            Firewall {
                hostname: "n/a".to_string(),
                mgmt_ip: "n/a".to_string(),
                serial: "001801000004".to_string(),
                model: "n/a".to_string(),
                connected: "no".to_string(),
                uptime: "n/a".to_string(),
                sw_version: "n/a".to_string(),
            },
            firewalls[3],
        );
    }

    #[test]
    fn appends_the_domain() {
        let filter = DeviceFilter {
            domain: Some("example.com".to_string()),
            ..Default::default()
        };
        let firewalls = parse_devices(DEVICES, &filter).unwrap();
        assert_eq!(
            vec!["fw-a.example.com", "fw-b.example.com", "fw-c.example.com", "n/a"],
            hostnames(&firewalls),
        );
    }

    #[test]
    fn lists_disconnected_devices() {
        for state in [DeviceState::Disconnected, DeviceState::NotConnected] {
            let filter = DeviceFilter {
                state,
                ..Default::default()
            };
            let firewalls = parse_devices(DEVICES, &filter).unwrap();
            assert_eq!(vec!["fw-c", "n/a"], hostnames(&firewalls));
        }
    }

    #[test]
    fn lists_connected_devices_only() {
        let filter = DeviceFilter {
            connected_only: true,
            ..Default::default()
        };
        let firewalls = parse_devices(DEVICES, &filter).unwrap();
        assert_eq!(vec!["fw-a", "fw-b"], hostnames(&firewalls));
    }

    #[test]
    fn accepts_an_empty_inventory() {
        let body = r#"<response status="success"><result><devices/></result></response>"#;
        assert!(parse_devices(body, &DeviceFilter::default()).unwrap().is_empty());
    }
}

mod device_state {
    use super::*;

    #[test]
    fn command() {
        assert_eq!(
            "<show><devices><connected></connected></devices></show>",
            DeviceState::Connected.command(),
        );
        for state in [
            DeviceState::Disconnected,
            DeviceState::NotConnected,
            DeviceState::Any,
            DeviceState::All,
        ] {
            assert_eq!("<show><devices><all></all></devices></show>", state.command());
        }
    }
}

mod run {
    use super::*;

    #[tokio::test]
    async fn queries_with_the_saved_key() {
        let api = FakeApi::new();
        api.respond("panorama", DEVICES);
        let filter = DeviceFilter {
            state: DeviceState::Connected,
            ..Default::default()
        };
        let op = ListFirewalls::new(api.clone(), "LUFRPT1234==", filter);

        let inventory = op
            .run(&Target::new("panorama"), &CancellationController::new())
            .await
            .unwrap();

        match inventory {
            Inventory::Devices(firewalls) => assert_eq!(4, firewalls.len()),
            x => panic!("expected Inventory::Devices but got {x:?}"),
        }
        let request = &api.requests()[0];
        assert_eq!(Some("op"), request.param("type"));
        assert_eq!(Some(DeviceState::Connected.command()), request.param("cmd"));
        assert_eq!(Some("LUFRPT1234=="), request.param("key"));
    }

    #[tokio::test]
    async fn returns_raw_xml_on_request() {
        let api = FakeApi::new();
        api.respond("panorama", r#"<response status="success"><result/></response>"#);
        let op = ListFirewalls::new(api, "key", DeviceFilter::default()).raw(true);

        let inventory = op
            .run(&Target::new("panorama"), &CancellationController::new())
            .await
            .unwrap();

        assert_eq!(
            Inventory::Raw("<response status=\"success\">\n  <result/>\n</response>\n".to_string()),
            inventory,
        );
    }
}

mod firewall_table {
    use super::*;

    fn inventory() -> Outcome<Inventory> {
        Outcome::Success {
            host: Target::new("panorama"),
            payload: Inventory::Devices(parse_devices(DEVICES, &DeviceFilter::default()).unwrap()),
        }
    }

    #[test]
    fn header_goes_to_stderr() {
        let header = FirewallTable::new(false).header();
        assert_eq!(2, header.len());
        assert!(header.iter().all(|line| line.stream == crate::report::Stream::Err));
        assert!(header[0].text.starts_with(&format!("{:30}\t{:15}\t", "Host", "MgmtIP")));
        assert!(header[1].text.starts_with(&format!("{}\t", "=".repeat(30))));
    }

    #[test]
    fn prints_tab_separated_rows() {
        let lines = FirewallTable::new(false).render(&inventory());
        assert_eq!(4, lines.len());
        assert_eq!(
            format!(
                "{:30}\t{:15}\t{:12}\t{:8}\t{:9}\t{:20}\t{:9}",
                "fw-a", "10.0.0.1", "001801000003", "PA-5220", "yes", "3 days, 04:05:06", "10.2.3"
            ),
            lines[0].text,
        );
    }

    #[test]
    fn terse_prints_hostnames_without_header() {
        let mut table = FirewallTable::new(true);
        assert!(table.header().is_empty());
        let lines: Vec<_> = table
            .render(&inventory())
            .into_iter()
            .map(|line| line.text)
            .collect();
        assert_eq!(vec!["fw-a", "fw-b", "fw-c", "n/a"], lines);
    }

    #[test]
    fn prints_raw_xml_line_by_line() {
        let outcome = Outcome::Success {
            host: Target::new("panorama"),
            payload: Inventory::Raw("<a>\n  <b/>\n</a>\n".to_string()),
        };
        assert_eq!(
            vec![Line::out("<a>"), Line::out("  <b/>"), Line::out("</a>")],
            FirewallTable::new(false).render(&outcome),
        );
    }

    #[test]
    fn reports_failures() {
        let outcome = Outcome::Failure(FailureInfo {
            host: Target::new("panorama"),
            kind: FailureKind::Transport,
            cause: "Unable to connect to host (timed out)".to_string(),
        });
        assert_eq!(
            vec![Line::err("panorama: Unable to connect to host (timed out)")],
            FirewallTable::new(false).render(&outcome),
        );
    }
}
