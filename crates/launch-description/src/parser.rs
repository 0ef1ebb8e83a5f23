//! Description parser

use crate::entity::{Entity, scalar_text};
use crate::{DescriptionError, LaunchDescription, Result, Settings};
use remote_launch::{Condition, DockerRunRemoteSsh, Fragments, LaunchTarget, OutputMode, Payload};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Action kind handled by [`parse_action`]
pub const DOCKER_RUN_REMOTE_SSH: &str = "docker_run_remote_ssh";

/// On-disk shape of a description
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescription {
    version: String,
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    arguments: BTreeMap<String, Value>,
    #[serde(default)]
    actions: Vec<BTreeMap<String, BTreeMap<String, Value>>>,
}

/// Parse a YAML description file
pub fn parse_file(path: impl AsRef<Path>) -> Result<LaunchDescription> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse a YAML description from a string
pub fn parse_str(content: &str) -> Result<LaunchDescription> {
    let raw: RawDescription = serde_yaml::from_str(content)?;

    if raw.version != "1.0" {
        return Err(DescriptionError::UnsupportedVersion(raw.version));
    }

    let mut arguments = BTreeMap::new();
    for (name, value) in raw.arguments {
        let text = scalar_text(&value).ok_or_else(|| DescriptionError::InvalidAttribute {
            action: "arguments".to_string(),
            attribute: name.clone(),
            reason: "expected a string, number or boolean".to_string(),
        })?;
        arguments.insert(name, text);
    }

    let mut actions = Vec::with_capacity(raw.actions.len());
    for entry in raw.actions {
        if entry.len() != 1 {
            return Err(DescriptionError::UnknownAction(format!(
                "expected one action per list item, found {}",
                entry.len()
            )));
        }
        for (kind, attrs) in entry {
            let action = parse_action(Entity::from_yaml(kind, attrs)?)?;
            debug!(session = %action.identity().short_id(), "parsed action");
            actions.push(action);
        }
    }

    Ok(LaunchDescription {
        version: raw.version,
        settings: raw.settings,
        arguments,
        actions,
    })
}

/// Build a `docker_run_remote_ssh` action from its attributes
///
/// `user`, `machine` and `image` are required. `port`, `options`,
/// `cmd` (or `command`), `output`, and one of `if`/`unless` are optional.
pub fn parse_action(mut entity: Entity) -> Result<DockerRunRemoteSsh> {
    if entity.kind() != DOCKER_RUN_REMOTE_SSH {
        return Err(DescriptionError::UnknownAction(entity.kind().to_string()));
    }
    let invalid = |attribute: &str, reason: String| DescriptionError::InvalidAttribute {
        action: DOCKER_RUN_REMOTE_SSH.to_string(),
        attribute: attribute.to_string(),
        reason,
    };

    let user = Fragments::parse(&entity.require_attr("user")?);
    let machine = Fragments::parse(&entity.require_attr("machine")?);
    let image = Fragments::parse(&entity.require_attr("image")?);

    let mut target = LaunchTarget::new(user, machine);
    if let Some(port) = entity.take_attr("port") {
        let port = Fragments::parse(&port);
        if let Some(literal) = port.as_literal() {
            literal
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| invalid("port", format!("'{}' is not a valid port", literal)))?;
        }
        target = target.with_port(port);
    }

    let mut payload = Payload::new(image);
    if let Some(options) = entity.take_attr("options") {
        payload = payload.with_options(Fragments::parse(&options));
    }
    let command = match (entity.take_attr("cmd"), entity.take_attr("command")) {
        (Some(_), Some(_)) => {
            return Err(invalid("cmd", "'cmd' and 'command' are aliases, give only one".to_string()));
        }
        (cmd, command) => cmd.or(command),
    };
    if let Some(command) = command {
        payload = payload.with_command(Fragments::parse(&command));
    }

    let condition = match (entity.take_attr("if"), entity.take_attr("unless")) {
        (Some(_), Some(_)) => {
            return Err(invalid("if", "'if' and 'unless' are mutually exclusive".to_string()));
        }
        (Some(expr), None) => Condition::If(Fragments::parse(&expr)),
        (None, Some(expr)) => Condition::Unless(Fragments::parse(&expr)),
        (None, None) => Condition::Always,
    };

    let output = match entity.take_attr("output") {
        Some(mode) => mode
            .parse::<OutputMode>()
            .map_err(|e| invalid("output", e.to_string()))?,
        None => OutputMode::default(),
    };

    entity.finish()?;

    Ok(DockerRunRemoteSsh::new(target, payload)
        .with_condition(condition)
        .with_output(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_launch::{LaunchSettings, ResolutionContext};

    fn entity() -> Entity {
        Entity::new(DOCKER_RUN_REMOTE_SSH)
            .with_attr("user", "alice")
            .with_attr("machine", "10.0.0.5")
            .with_attr("image", "myimg")
    }

    #[test]
    fn test_missing_user_is_rejected() {
        let entity = Entity::new(DOCKER_RUN_REMOTE_SSH)
            .with_attr("machine", "10.0.0.5")
            .with_attr("image", "myimg");
        assert!(matches!(
            parse_action(entity),
            Err(DescriptionError::MissingAttribute { ref attribute, .. }) if attribute == "user"
        ));
    }

    #[test]
    fn test_missing_machine_is_rejected() {
        let entity = Entity::new(DOCKER_RUN_REMOTE_SSH)
            .with_attr("user", "alice")
            .with_attr("image", "myimg");
        assert!(matches!(
            parse_action(entity),
            Err(DescriptionError::MissingAttribute { ref attribute, .. }) if attribute == "machine"
        ));
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        assert!(matches!(
            parse_action(entity().with_attr("hostname", "x")),
            Err(DescriptionError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_invalid_literal_port_is_rejected() {
        for port in ["ssh", "0", "70000"] {
            assert!(
                matches!(
                    parse_action(entity().with_attr("port", port)),
                    Err(DescriptionError::InvalidAttribute { .. })
                ),
                "port {} accepted",
                port
            );
        }
    }

    #[test]
    fn test_port_reference_is_deferred() {
        let action = parse_action(entity().with_attr("port", "${ssh_port}")).unwrap();
        let ctx = ResolutionContext::new().with_var("ssh_port", "2200");
        let plan = action.plan(&ctx, &LaunchSettings::default()).unwrap().unwrap();
        assert!(plan.teardown_command.starts_with("ssh -p 2200 -t alice@10.0.0.5 "));
    }

    #[test]
    fn test_cmd_and_command_are_exclusive_aliases() {
        let action = parse_action(entity().with_attr("command", "echo hi")).unwrap();
        assert!(action.payload().command().is_some());

        assert!(parse_action(entity().with_attr("cmd", "a").with_attr("command", "b")).is_err());
    }

    #[test]
    fn test_if_and_unless_are_exclusive() {
        assert!(parse_action(entity().with_attr("if", "true").with_attr("unless", "false")).is_err());

        let action = parse_action(entity().with_attr("unless", "${skip}")).unwrap();
        assert!(matches!(action.condition(), Condition::Unless(_)));
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        assert!(matches!(
            parse_action(Entity::new("execute_process_remote_ssh")),
            Err(DescriptionError::UnknownAction(_))
        ));
    }
}
