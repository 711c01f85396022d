// resolution_flow.rs — End-to-end tests for both engine operations.
//
// Each test writes a project layout to a temp dir:
//
//   .tp/library.yaml            policy library
//   .tp/topologies/<id>.yaml    topology snapshot
//
// and drives the engine exactly as the CLI does.

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use tp_engine::{
    DeployError, Engine, EngineConfig, EngineError, ParameterSource, PolicySource, TraceOutcome,
};

const LIBRARY: &str = r#"
policies:
  - id: deny-public-s3
    display_name: deny-public-s3
    category: storage
    severity: critical
    statements:
      - sid: DenyPublicAcl
        effect: deny
        actions: ["s3:PutBucketAcl"]
        resources: ["arn:aws:s3:::${prefix}-*"]
    variables:
      prefix:
        default: corp
        description: bucket name prefix
  - id: require-encryption
    display_name: require-encryption
    category: storage
    severity: high
    statements:
      - effect: deny
        actions: ["s3:PutObject"]
        conditions:
          s3:x-amz-server-side-encryption: "${algorithm}"
    variables:
      algorithm:
        default: aws:kms
"#;

const ESTATE: &str = r#"
topology_id: estate
name: Estate
compartments:
  - id: root
    policies:
      - kind: library
        policy_id: deny-public-s3
      - kind: library
        policy_id: require-encryption
      - kind: inline
        name: root-break-glass
        inherit: false
        statements:
          - effect: allow
            actions: ["*"]
  - id: prod
    parent_id: root
    suppressed: [deny-public-s3]
    defaults:
      region: eu-west-1
  - id: prod-eu
    parent_id: prod
    policies:
      - kind: library
        policy_id: require-encryption
        variable_overrides:
          algorithm: AES256
      - kind: library
        policy_id: retired-policy
  - id: dev
    parent_id: root
    tags:
      region: us-west-2
blueprints:
  - id: vpc
    parameters:
      - name: cidr
        is_required: true
      - name: region
        display_name: Region
        tag_key: region
        default: us-east-1
  - id: service
    parameters:
      - name: image
        is_required: true
      - name: region
        tag_key: region
        default: us-east-1
stacks:
  - id: A
    blueprint_id: vpc
    compartment_id: prod
    parameter_overrides:
      cidr: 10.0.0.0/16
  - id: B
    blueprint_id: service
    compartment_id: dev
    depends_on: [A]
    parameter_overrides:
      image: web:1.2
  - id: C
    blueprint_id: service
    compartment_id: prod-eu
    depends_on: [A]
"#;

fn write_project(root: &Path, topologies: &[(&str, &str)]) -> Engine {
    let tp = root.join(".tp");
    fs::create_dir_all(tp.join("topologies")).unwrap();
    fs::write(tp.join("library.yaml"), LIBRARY).unwrap();
    for (id, yaml) in topologies {
        fs::write(tp.join("topologies").join(format!("{}.yaml", id)), yaml).unwrap();
    }
    Engine::new(EngineConfig::load(root).unwrap())
}

#[test]
fn root_sees_its_own_policies_as_explicit() {
    let dir = tempdir().unwrap();
    let engine = write_project(dir.path(), &[("estate", ESTATE)]);

    let policies = engine
        .resolve_compartment_policies("estate", "root")
        .unwrap();
    let names: Vec<&str> = policies.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["deny-public-s3", "require-encryption", "root-break-glass"]
    );
    assert!(policies.iter().all(|p| p.source == PolicySource::Explicit));
    assert_eq!(
        policies[0].statements[0].resources,
        vec!["arn:aws:s3:::corp-*"]
    );
}

#[test]
fn prod_suppresses_inherited_s3_policy() {
    let dir = tempdir().unwrap();
    let engine = write_project(dir.path(), &[("estate", ESTATE)]);

    let policies = engine
        .resolve_compartment_policies("estate", "prod")
        .unwrap();
    let names: Vec<&str> = policies.iter().map(|p| p.name.as_str()).collect();
    // Suppressed, and the non-inheritable break-glass policy stays on root.
    assert_eq!(names, vec!["require-encryption"]);
    assert_eq!(policies[0].source, PolicySource::InheritedLibrary);
    assert_eq!(policies[0].attached_at, "root");
}

#[test]
fn grandchild_prefers_nearest_attachment_and_keeps_unknown_policy() {
    let dir = tempdir().unwrap();
    let engine = write_project(dir.path(), &[("estate", ESTATE)]);

    let trace = engine
        .trace_compartment_policies("estate", "prod-eu")
        .unwrap();
    assert_eq!(trace.chain, vec!["prod-eu", "prod", "root"]);

    let ids: Vec<&str> = trace.policies.iter().map(|p| p.policy_id.as_str()).collect();
    // prod's suppression list does not apply to prod-eu.
    assert_eq!(
        ids,
        vec!["require-encryption", "retired-policy", "deny-public-s3"]
    );

    let encryption = &trace.policies[0];
    assert_eq!(encryption.source, PolicySource::Explicit);
    assert_eq!(
        encryption.statements[0].conditions["s3:x-amz-server-side-encryption"],
        "AES256"
    );

    let retired = &trace.policies[1];
    assert!(retired.statements.is_empty());

    assert!(trace
        .steps
        .iter()
        .any(|s| s.outcome == TraceOutcome::UnknownLibraryPolicy));
    assert!(trace.steps.iter().any(|s| s.outcome
        == TraceOutcome::Shadowed {
            by: "prod-eu".to_string()
        }));
}

#[test]
fn unknown_compartment_is_reported() {
    let dir = tempdir().unwrap();
    let engine = write_project(dir.path(), &[("estate", ESTATE)]);
    let err = engine
        .resolve_compartment_policies("estate", "staging")
        .unwrap_err();
    assert!(matches!(err, EngineError::Policy(_)));
}

#[test]
fn preview_orders_waves_and_resolves_parameters() {
    let dir = tempdir().unwrap();
    let engine = write_project(dir.path(), &[("estate", ESTATE)]);

    let preview = engine.preview_resolution("estate").unwrap();
    assert_eq!(
        preview.deployment_order.waves,
        vec![vec!["A"], vec!["B", "C"]]
    );

    // A: region has a tag key but no tag anywhere → compartment default.
    let a = &preview.stacks[0];
    assert_eq!(a.parameters[1].source, ParameterSource::CompartmentDefault);
    assert_eq!(a.parameters[1].value.as_deref(), Some("eu-west-1"));
    assert_eq!(a.parameters[1].display_name, "Region");
    assert!(a.is_complete);

    // B: dev carries a region tag → tag_ref.
    let b = &preview.stacks[1];
    assert_eq!(b.parameters[1].source, ParameterSource::TagRef);
    assert_eq!(b.parameters[1].value.as_deref(), Some("us-west-2"));
    assert!(b.is_complete);

    // C: no image anywhere; prod-eu has no region default → blueprint default.
    let c = &preview.stacks[2];
    assert_eq!(c.parameters[0].source, ParameterSource::Unresolved);
    assert_eq!(c.parameters[1].source, ParameterSource::BlueprintDefault);
    assert_eq!(c.unresolved_count, 1);

    assert!(!preview.all_complete);
    assert_eq!(preview.total_unresolved, 1);
}

#[test]
fn preview_is_byte_identical_across_calls() {
    let dir = tempdir().unwrap();
    let engine = write_project(dir.path(), &[("estate", ESTATE)]);
    let first = serde_json::to_vec(&engine.preview_resolution("estate").unwrap()).unwrap();
    let second = serde_json::to_vec(&engine.preview_resolution("estate").unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn cycle_fails_the_preview() {
    let cyclic = r#"
topology_id: loop
stacks:
  - { id: A, blueprint_id: x, depends_on: [B] }
  - { id: B, blueprint_id: x, depends_on: [A] }
"#;
    let dir = tempdir().unwrap();
    let engine = write_project(dir.path(), &[("loop", cyclic)]);
    let err = engine.preview_resolution("loop").unwrap_err();
    match err {
        EngineError::Deploy(DeployError::Cycle { stack_ids }) => {
            assert_eq!(stack_ids, vec!["A", "B"])
        }
        other => panic!("expected cycle, got {:?}", other),
    }
}

#[test]
fn compartment_cycle_rejected_on_load() {
    let broken = r#"
topology_id: broken
compartments:
  - { id: a, parent_id: b }
  - { id: b, parent_id: a }
"#;
    let dir = tempdir().unwrap();
    let engine = write_project(dir.path(), &[("broken", broken)]);
    let err = engine.preview_resolution("broken").unwrap_err();
    assert!(matches!(err, EngineError::Topology(_)));
}

#[test]
fn lists_stored_topologies() {
    let dir = tempdir().unwrap();
    let engine = write_project(dir.path(), &[("estate", ESTATE), ("empty", "topology_id: empty\n")]);
    assert_eq!(engine.list_topologies().unwrap(), vec!["empty", "estate"]);

    let preview = engine.preview_resolution("empty").unwrap();
    assert!(preview.all_complete);
    assert!(preview.deployment_order.is_empty());
}
