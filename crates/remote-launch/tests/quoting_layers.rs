//! Layer-by-layer verification of the composed shell commands
//!
//! Each shell layer is stripped with a POSIX word splitter and the words it
//! hands to the next layer are compared exactly.

use remote_launch::{
    CommandComposer, DockerRunRemoteSsh, LaunchSettings, LaunchTarget, Payload, ResolutionContext,
    SessionIdentity,
};

const FULL_ID: &str = "fedcba9876543210fedcba9876543210";

struct Case {
    user: &'static str,
    host: &'static str,
    port: Option<&'static str>,
    image: &'static str,
    options: Option<&'static str>,
    command: Option<&'static str>,
}

const CASES: &[Case] = &[
    Case { user: "alice", host: "10.0.0.5", port: None, image: "myimg", options: None, command: None },
    Case { user: "alice", host: "10.0.0.5", port: Some("2222"), image: "myimg", options: None, command: Some("echo hi") },
    Case { user: "ops", host: "arm.factory.local", port: None, image: "ros:humble", options: Some("--rm --net host"), command: Some("ros2 launch demo demo.launch.py") },
    Case { user: "robot", host: "jetson-1", port: Some("22022"), image: "registry.local/nav:1.2", options: Some("-e ROS_DOMAIN_ID=7"), command: None },
];

fn build(case: &Case) -> (LaunchTarget, Payload) {
    let mut target = LaunchTarget::new(case.user, case.host);
    if let Some(port) = case.port {
        target = target.with_port(port);
    }
    let mut payload = Payload::new(case.image);
    if let Some(options) = case.options {
        payload = payload.with_options(options);
    }
    if let Some(command) = case.command {
        payload = payload.with_command(command);
    }
    (target, payload)
}

fn identity() -> SessionIdentity {
    SessionIdentity::from_full_id(FULL_ID).unwrap()
}

fn split(layer: &str) -> Vec<String> {
    shlex::split(layer).unwrap_or_else(|| panic!("layer does not parse: {}", layer))
}

fn ssh_words(case: &Case) -> Vec<String> {
    let mut words = vec!["ssh".to_string()];
    if let Some(port) = case.port {
        words.push("-p".into());
        words.push(port.into());
    }
    words.push("-t".into());
    words.push(format!("{}@{}", case.user, case.host));
    words
}

fn process_name(case: &Case) -> String {
    format!("{}_fedcba987654", case.host.replace('.', "_"))
}

fn docker_run(case: &Case) -> String {
    let mut run = format!("docker run --name cntr_{}", process_name(case));
    if let Some(options) = case.options {
        run.push(' ');
        run.push_str(options);
    }
    run.push(' ');
    run.push_str(case.image);
    if let Some(command) = case.command {
        run.push(' ');
        run.push_str(command);
    }
    run
}

#[test]
fn test_launch_command_unwraps_layer_by_layer() {
    let ctx = ResolutionContext::new();
    for case in CASES {
        let (target, payload) = build(case);
        let composed = CommandComposer::new().compose(&target, &payload, &identity());
        let launch = composed.launch_command.resolve(&ctx).unwrap();

        // Layer 1: local shell
        let words = split(&launch);
        let screen_at = words.iter().position(|w| w == "screen").expect("screen invocation");
        assert_eq!(
            words[..screen_at],
            ["{", "outer_stdout=$(readlink", "-f", "/proc/self/fd/3);", "}", "3>&1", "&&"]
        );
        let screen = &words[screen_at..];
        assert_eq!(screen.len(), 9, "unexpected screen words: {:?}", screen);
        assert_eq!(screen[..4], ["screen", "-D", "-m", "-S"]);
        assert_eq!(screen[4], process_name(case));
        assert_eq!(screen[5..8], ["bash", "-i", "-c"]);

        // Layer 2: bash inside screen
        let words = split(&screen[8]);
        let ssh = ssh_words(case);
        assert_eq!(words[..ssh.len()], ssh[..]);
        assert_eq!(words.len(), ssh.len() + 3, "unexpected ssh words: {:?}", words);
        assert_eq!(words[ssh.len() + 1], ">");
        assert_eq!(words[ssh.len() + 2], "$outer_stdout");

        // Layer 3: remote shell
        let words = split(&words[ssh.len()]);
        assert_eq!(words.len(), 4, "unexpected remote words: {:?}", words);
        assert_eq!(words[..3], ["bash", "-i", "-c"]);

        // Layer 4: the workload
        assert_eq!(words[3], docker_run(case));
    }
}

#[test]
fn test_teardown_command_unwraps_layer_by_layer() {
    let ctx = ResolutionContext::new();
    for case in CASES {
        let (target, payload) = build(case);
        let composed = CommandComposer::new().compose(&target, &payload, &identity());
        let teardown = composed.teardown_command.resolve(&ctx).unwrap();

        let words = split(&teardown);
        let ssh = ssh_words(case);
        assert_eq!(words[..ssh.len()], ssh[..]);
        assert_eq!(words.len(), ssh.len() + 1);

        let remote = split(&words[ssh.len()]);
        assert_eq!(remote[..2], ["bash", "-c"]);
        assert_eq!(remote[2], format!("docker kill cntr_{}", process_name(case)));
    }
}

#[test]
fn test_exactly_one_screen_and_ssh_and_port_iff_given() {
    let ctx = ResolutionContext::new();
    for case in CASES {
        let (target, payload) = build(case);
        let composed = CommandComposer::new().compose(&target, &payload, &identity());
        let launch = composed.launch_command.resolve(&ctx).unwrap();

        assert_eq!(launch.matches("screen -D -m -S").count(), 1);
        assert_eq!(launch.matches("ssh ").count(), 1);
        assert_eq!(launch.contains("ssh -p "), case.port.is_some());
    }
}

#[test]
fn test_process_name_never_contains_dots() {
    let ctx = ResolutionContext::new();
    for host in ["10.0.0.5", "a.b.c.d.e", "robot.", ".leading", "plain"] {
        let target = LaunchTarget::new("u", host);
        let composed = CommandComposer::new().compose(&target, &Payload::new("i"), &identity());
        let name = composed.process_name.resolve(&ctx).unwrap();
        assert!(!name.contains('.'), "{} kept a dot", name);
        assert!(name.ends_with("_fedcba987654"));
    }
}

#[test]
fn test_teardown_for_plain_host() {
    let target = LaunchTarget::new("alice", "10.0.0.5");
    let action = DockerRunRemoteSsh::new(target, Payload::new("myimg"));
    let short_id = action.identity().short_id().to_string();

    let plan = action
        .plan(&ResolutionContext::new(), &LaunchSettings::default())
        .unwrap()
        .unwrap();

    assert_eq!(
        plan.teardown_command,
        format!(r#"ssh -t alice@10.0.0.5 "bash -c 'docker kill cntr_10_0_0_5_{}'""#, short_id)
    );
    assert_eq!(plan.monitor.config.docker_kill_command, plan.teardown_command);
}
