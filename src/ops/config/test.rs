use super::*;
use crate::api::fixtures::FakeApi;
use crate::error::HostError;
use crate::ssh::fixtures::{Call, FakeConnector};

const TRANSCRIPT: &str = "Last login: Mon Oct 19 09:00:00 2026\n\
    admin@fw-a> set cli config-output-format set\n\
    admin@fw-a> configure\n\
    Entering configuration mode\n\
    set deviceconfig system hostname fw-a\n\
    set deviceconfig system timezone UTC\n\
    [edit]\n\
    admin@fw-a# \n\
    admin@fw-a# exit\n\
    Exiting configuration mode";

mod config_source {
    use super::*;

    #[test]
    fn type_uses_an_operational_command() {
        assert_eq!(
            vec![
                ("type", "op".to_string()),
                (
                    "cmd",
                    "<show><config><pushed-shared-policy></pushed-shared-policy></config></show>"
                        .to_string()
                ),
            ],
            ConfigSource::from(ConfigType::PushedSharedPolicy).params(),
        );
    }

    #[test]
    fn xpath_uses_a_config_query() {
        let xpath = "/config/devices/entry/deviceconfig/system";
        assert_eq!(
            vec![
                ("type", "config".to_string()),
                ("action", "show".to_string()),
                ("xpath", xpath.to_string()),
            ],
            ConfigSource::XPath(xpath.to_string()).params(),
        );
    }
}

mod config_type {
    use super::*;

    #[test]
    fn displays_as_cli_names() {
        assert_eq!("running", ConfigType::default().to_string());
        assert_eq!("synced-diff", ConfigType::SyncedDiff.to_string());
        assert_eq!("pushed-template", ConfigType::PushedTemplate.to_string());
    }
}

mod xml_config {
    use super::*;

    #[tokio::test]
    async fn returns_pretty_xml() {
        let api = FakeApi::new();
        api.respond(
            "fw-a",
            r#"<response status="success"><result><config><devices/></config></result></response>"#,
        );
        let op = XmlConfig::new(api.clone(), "LUFRPT1234==", ConfigType::Candidate.into());

        let config = op
            .run(&Target::new("fw-a"), &CancellationController::new())
            .await
            .unwrap();

        assert_eq!(
            "<response status=\"success\">\n  <result>\n    <config>\n      <devices/>\n    \
             </config>\n  </result>\n</response>\n",
            config,
        );
        let request = &api.requests()[0];
        assert_eq!(
            Some("<show><config><candidate></candidate></config></show>"),
            request.param("cmd"),
        );
        assert_eq!(Some("LUFRPT1234=="), request.param("key"));
    }

    #[tokio::test]
    async fn fails_on_api_error() {
        let api = FakeApi::new();
        api.respond(
            "fw-a",
            r#"<response status="error"><msg><line>No such node</line></msg></response>"#,
        );
        let op = XmlConfig::new(api, "key", ConfigSource::XPath("/bogus".to_string()));

        let err = op
            .run(&Target::new("fw-a"), &CancellationController::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HostError>(),
            Some(HostError::Api(msg)) if msg == "No such node"
        ));
    }
}

mod set_config {
    use super::*;

    #[tokio::test]
    async fn runs_the_script_and_strips_prompts() {
        let connector = FakeConnector::new();
        connector.output("fw-a", &SET_FORMAT_SCRIPT.join("\n"), TRANSCRIPT);
        let op = SetConfig::new(connector.clone());

        let config = op
            .run(&Target::new("fw-a"), &CancellationController::new())
            .await
            .unwrap();

        assert_eq!(
            "set deviceconfig system hostname fw-a\nset deviceconfig system timezone UTC",
            config,
        );
        assert_eq!(
            vec![
                Call::Script(SET_FORMAT_SCRIPT.iter().map(|c| c.to_string()).collect()),
                Call::Close,
            ],
            connector.calls("fw-a"),
        );
    }

    #[tokio::test]
    async fn closes_the_session_after_a_failure() {
        let connector = FakeConnector::new();
        connector.fail_commands("fw-a");
        let op = SetConfig::new(connector.clone());

        let result = op
            .run(&Target::new("fw-a"), &CancellationController::new())
            .await;

        assert!(result.is_err());
        assert_eq!(Some(&Call::Close), connector.calls("fw-a").last());
    }

    #[tokio::test]
    async fn fails_when_unreachable() {
        let connector = FakeConnector::new();
        connector.set_unreachable("fw-a");
        let op = SetConfig::new(connector);

        let err = op
            .run(&Target::new("fw-a"), &CancellationController::new())
            .await
            .unwrap_err();
        assert_eq!("Unable to connect to host (connection refused)", err.to_string());
    }
}

mod strip_transcript {
    use super::*;

    #[test]
    fn returns_nothing_for_a_short_transcript() {
        assert_eq!("", strip_transcript("admin@fw-a> \n"));
    }
}
