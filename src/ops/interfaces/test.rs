use super::*;
use crate::api::fixtures::FakeApi;

const INTERFACES: &str = r#"<response status="success"><result>
    <ifnet>
        <entry><name>tunnel.1</name><ip>N/A</ip></entry>
        <entry><name>ethernet1/2</name><ip>192.168.1.1/24</ip></entry>
        <entry><name>ethernet1/1</name><ip>10.0.0.1/24</ip></entry>
    </ifnet>
    <hw>
        <entry><name>ethernet1/1</name><state>up</state></entry>
        <entry><name>ethernet1/2</name><state>down</state></entry>
    </hw>
</result></response>"#;

fn rows() -> Outcome<HostInterfaces> {
    Outcome::Success {
        host: Target::new("fw-a"),
        payload: HostInterfaces::Rows(parse_interfaces(INTERFACES).unwrap()),
    }
}

fn texts(lines: Vec<Line>) -> Vec<String> {
    lines.into_iter().map(|line| line.text).collect()
}

mod parse_interfaces {
    use super::*;

    #[test]
    fn joins_state_by_name_and_sorts() {
        assert_eq!(
            vec![
                Interface {
                    name: "ethernet1/1".to_string(),
                    state: "up".to_string(),
                    ip: "10.0.0.1/24".to_string(),
                },
                Interface {
                    name: "ethernet1/2".to_string(),
                    state: "down".to_string(),
                    ip: "192.168.1.1/24".to_string(),
                },
                Interface {
                    name: "tunnel.1".to_string(),
                    state: "n/a".to_string(),
                    ip: "N/A".to_string(),
                },
            ],
            parse_interfaces(INTERFACES).unwrap(),
        );
    }

    #[test]
    fn fails_on_garbage() {
        assert!(matches!(
            parse_interfaces("<response"),
            Err(HostError::Parse(_))
        ));
    }
}

mod ipv4_address {
    use super::*;

    #[test]
    fn works() {
        assert_eq!(Some("10.0.0.1"), ipv4_address("10.0.0.1/24"));
        assert_eq!(Some("172.16.0.9"), ipv4_address("addr 172.16.0.9 (dhcp)"));
        assert_eq!(None, ipv4_address("N/A"));
        assert_eq!(None, ipv4_address(""));
    }
}

mod run {
    use super::*;

    #[tokio::test]
    async fn sends_show_interface_all() {
        let api = FakeApi::new();
        api.respond("fw-a", INTERFACES);
        let op = ShowInterfaces::new(api.clone(), "LUFRPT1234==");

        let payload = op
            .run(&Target::new("fw-a"), &CancellationController::new())
            .await
            .unwrap();

        assert!(matches!(payload, HostInterfaces::Rows(rows) if rows.len() == 3));
        let request = &api.requests()[0];
        assert_eq!(Some("<show><interface>all</interface></show>"), request.param("cmd"));
        assert_eq!(Some("LUFRPT1234=="), request.param("key"));
    }
}

mod interface_table {
    use super::*;

    #[test]
    fn prints_every_row() {
        let lines = InterfaceTable::new(None, false).render(&rows());
        assert_eq!(
            vec![
                format!("{:25}\t{:20}\t{:5}\t{:20}", "fw-a", "ethernet1/1", "up", "10.0.0.1/24"),
                format!("{:25}\t{:20}\t{:5}\t{:20}", "fw-a", "ethernet1/2", "down", "192.168.1.1/24"),
                format!("{:25}\t{:20}\t{:5}\t{:20}", "fw-a", "tunnel.1", "n/a", "N/A"),
            ],
            texts(lines),
        );
    }

    #[test]
    fn filters_by_link_state() {
        let lines = InterfaceTable::new(Some(LinkState::Down), false).render(&rows());
        assert_eq!(1, lines.len());
        assert!(lines[0].text.contains("ethernet1/2"));
    }

    #[test]
    fn terse_prints_addresses_only() {
        let mut table = InterfaceTable::new(None, true);
        assert!(table.header().is_empty());
        assert_eq!(vec!["10.0.0.1", "192.168.1.1"], texts(table.render(&rows())));
    }

    #[test]
    fn terse_honours_the_state_filter() {
        let mut table = InterfaceTable::new(Some(LinkState::Up), true);
        assert_eq!(vec!["10.0.0.1"], texts(table.render(&rows())));
    }

    #[test]
    fn has_a_header() {
        let header = InterfaceTable::new(None, false).header();
        assert_eq!(
            format!("{:25}\t{:20}\t{:5}\t{:20}", "Firewall", "Interface", "State", "IpAddress"),
            header[0].text,
        );
    }

    #[test]
    fn prints_raw_xml_under_a_banner() {
        let outcome = Outcome::Success {
            host: Target::new("fw-a"),
            payload: HostInterfaces::Raw("<response/>\n".to_string()),
        };
        assert_eq!(
            vec!["========", "= fw-a =", "========", "<response/>"],
            texts(InterfaceTable::new(None, false).render(&outcome)),
        );
    }
}
