use pretty_assertions::assert_eq;
use proptest::prelude::*;
use vqc_engine::{
    CompileConfig, CompileError, CompiledArtifact, Compiler, ErrorKind, GroupId, ResolveError,
    ResolverResult,
};
use vqc_test_utils::{
    arb_plain_node, init_tracing, known, resolve_at, resolve_each, since, test_registry, versions,
    when,
};
use vqc_tree::{Node, Version};

proptest! {
    #[test]
    fn prop_plain_tree_resolves_to_itself(tree in arb_plain_node(), n in 1..6usize) {
        let registry = test_registry();
        for (_, resolved) in resolve_each(&registry, &versions(n), &tree) {
            prop_assert_eq!(&resolved, &tree);
        }
    }

    #[test]
    fn prop_plain_tree_is_elided(tree in arb_plain_node(), n in 1..6usize) {
        let registry = test_registry();
        let artifact = Compiler::new(&registry).compile("api", &versions(n), &tree).unwrap();
        prop_assert_eq!(artifact, CompiledArtifact::Resolved(tree));
    }

    #[test]
    fn prop_group_count_matches_distinct_outcomes(cut in 0..40usize, n in 1..40usize) {
        let registry = test_registry();
        let known = versions(n);
        let cut = cut % n;
        let tree = Node::seq([since(&format!("v{cut}"), [Node::str("x")])]);

        let distinct: std::collections::HashSet<Node> = resolve_each(&registry, &known, &tree)
            .into_iter()
            .map(|(_, tree)| tree)
            .collect();
        let artifact = Compiler::new(&registry).compile("api", &known, &tree).unwrap();
        prop_assert_eq!(artifact.group_count(), distinct.len());
    }
}

#[test]
fn test_two_hundred_versions_compact_to_two_groups() {
    init_tracing();
    let registry = test_registry();
    let known = versions(200);
    let tree = Node::map([
        (Node::str("name"), Node::str("widget")),
        (since("v150", [Node::str("color")]), Node::str("red")),
    ]);

    let artifact = Compiler::new(&registry).compile("api", &known, &tree).unwrap();
    let dispatch = artifact.as_dispatch().unwrap();

    assert_eq!(dispatch.group_count(), 2);
    assert_eq!(dispatch.version_to_group().len(), 200);
    assert_eq!(dispatch.versions_in(GroupId::new(0)).len(), 150);
    assert_eq!(dispatch.versions_in(GroupId::new(1)).len(), 50);
    assert_eq!(
        dispatch.tree(GroupId::new(1)),
        Some(&Node::map([
            (Node::str("name"), Node::str("widget")),
            (Node::str("color"), Node::str("red")),
        ]))
    );
}

#[test]
fn test_version_sensitive_qualifier_with_uniform_outcome_is_elided() {
    let registry = test_registry();
    let tree = Node::seq([since("v0", [Node::int(1)]), Node::invoke("drop", [])]);
    let artifact = Compiler::new(&registry).compile("api", &versions(5), &tree).unwrap();
    assert!(artifact.is_elided());
    assert_eq!(artifact, CompiledArtifact::Resolved(Node::seq([Node::int(1)])));
}

#[test]
fn test_runtime_selection_errors_name_selector_and_versions() {
    let registry = test_registry();
    let known = known(&["a", "b"]);
    let tree = Node::seq([when("b", [Node::str("x")])]);
    let artifact = Compiler::new(&registry).compile("api-version", &known, &tree).unwrap();

    assert_eq!(artifact.select(Some(&"b".into())).unwrap(), &Node::seq([Node::str("x")]));

    let unbound = artifact.select(None).unwrap_err();
    assert_eq!(unbound.kind(), ErrorKind::UnboundOrUnknownRuntimeVersion);
    assert_eq!(
        unbound.to_string(),
        "version selector `api-version` is not bound; expected one of [a, b]"
    );

    let unknown = artifact.select(Some(&"c".into())).unwrap_err();
    assert_eq!(
        unknown.to_string(),
        "version selector `api-version` is bound to unrecognized version `c`; expected one of [a, b]"
    );
}

#[test]
fn test_cyclic_qualifier_hits_pass_limit() {
    let registry = test_registry();
    let tree = Node::seq([Node::invoke("grow", [])]);
    let err = Compiler::new(&registry)
        .with_config(CompileConfig::new().with_max_passes(3))
        .compile("api", &versions(2), &tree)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PassLimitExceeded);
    match err {
        CompileError::Resolve(ResolveError::PassLimitExceeded {
            node,
            version,
            max_passes,
            last_forms,
        }) => {
            assert_eq!(*node, Node::invoke("grow", []));
            assert_eq!(version, Version::new("v0"));
            assert_eq!(max_passes, 3);
            assert_eq!(last_forms.len(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_nested_expansion_converges_within_limit() {
    let registry = test_registry();
    // Each pass peels one `splice` layer.
    let mut node = Node::int(7);
    for _ in 0..5 {
        node = Node::invoke("splice", [node]);
    }
    let tree = Node::seq([node]);
    assert_eq!(
        resolve_at(&registry, &versions(1), "v0", &tree),
        Node::seq([Node::int(7)])
    );

    let err = Compiler::new(&registry)
        .with_config(CompileConfig::new().with_max_passes(4))
        .resolve_version(&versions(1), &"v0".into(), &tree)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PassLimitExceeded);
}

#[test]
fn test_unregistered_tag_is_unknown_qualifier() {
    let registry = test_registry();
    let tree = Node::seq([Node::invoke("nope", [Node::int(1)])]);
    let err = Compiler::new(&registry)
        .compile("api", &versions(2), &tree)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownQualifier);
    assert!(err.to_string().contains("`nope`"));
}

#[test]
fn test_override_replaces_qualifier() {
    let mut registry = test_registry();
    let previous = registry.register_fn("drop", |_ctx, args| Ok(ResolverResult::Forms(args.to_vec())));
    assert!(previous.is_some());

    let tree = Node::seq([Node::invoke("drop", [Node::int(1)])]);
    assert_eq!(
        resolve_at(&registry, &versions(1), "v0", &tree),
        Node::seq([Node::int(1)])
    );
}

#[test]
fn test_root_invocation_rules() {
    let registry = test_registry();
    let known = versions(2);

    let root = since("v1", [Node::map([(Node::str("k"), when("v1", [Node::int(1)]))])]);
    assert_eq!(
        resolve_at(&registry, &known, "v1", &root),
        Node::map([(Node::str("k"), Node::int(1))])
    );

    let err = Compiler::new(&registry).compile("api", &known, &root).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RootMultiplicityViolation);
}

#[test]
fn test_mapping_value_with_many_forms_fails() {
    let registry = test_registry();
    let tree = Node::map([(Node::str("k"), Node::invoke("splice", [Node::int(1), Node::int(2)]))]);
    let err = Compiler::new(&registry).compile("api", &versions(1), &tree).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MultiFormInSlot);
}

#[test]
fn test_parallel_and_sequential_agree() {
    let registry = test_registry();
    let known = versions(32);
    let tree = Node::seq([
        since("v8", [Node::str("a")]),
        since("v16", [Node::str("b")]),
        Node::map([(Node::str("k"), when("v3", [Node::int(3)]))]),
    ]);

    let sequential = Compiler::new(&registry).resolve_all(&known, &tree).unwrap();
    let parallel = Compiler::new(&registry)
        .with_config(CompileConfig::new().with_parallel(true))
        .resolve_all(&known, &tree)
        .unwrap();
    assert_eq!(sequential, parallel);

    let artifact = Compiler::new(&registry)
        .with_config(CompileConfig::new().with_parallel(true))
        .compile("api", &known, &tree)
        .unwrap();
    assert_eq!(artifact.group_count(), 4);
}

#[test]
fn test_config_loaded_from_toml_drives_compilation() {
    let registry = test_registry();
    let config = CompileConfig::from_toml("max_passes = 2\nparallel = true").unwrap();
    let tree = Node::seq([Node::invoke("grow", [])]);
    let err = Compiler::new(&registry)
        .with_config(config)
        .compile("api", &versions(3), &tree)
        .unwrap_err();
    assert!(matches!(
        err,
        CompileError::Resolve(ResolveError::PassLimitExceeded { max_passes: 2, .. })
    ));
}
