mod test_support;

use fanin_core::{resolve, FanInFailure, FanInResolver, MaterialConfig, ResolveError};
use test_support::{dep, fp_of, CountingHistory, Fixture, Used};

/// git -> a, b -> p (diamante simple).
fn diamond() -> (Fixture, MaterialConfig) {
    let git = MaterialConfig::git("git-url");
    let mut f = Fixture::new();
    f.pipeline("a", vec![git.clone()]);
    f.pipeline("b", vec![git.clone().with_folder("b-src")]);
    f.pipeline("p", vec![dep("a", "build").into(), dep("b", "build").into()]);
    (f, git)
}

#[test]
fn every_root_resolves_to_one_revision_reachable_from_all_edges() {
    let (f, git) = diamond();
    f.checkin(&git, &["g1", "g2"]);
    f.run_and_pass("a", 1, "build", &[Used::Rev(&git, "g1")]);
    f.run_and_pass("a", 2, "build", &[Used::Rev(&git, "g2")]);
    f.run_and_pass("b", 1, "build", &[Used::Rev(&git, "g1")]);

    let graph = f.graph("p");
    let resolved = resolve(&graph, &f.history, 100).expect("resolved");

    assert_eq!(resolved.roots.len(), 1);
    let rev = resolved.revision_of(&git.fingerprint()).expect("git pinned");
    assert_eq!(rev.revision, "g1");
    let provenance = resolved.provenance(&git.fingerprint());
    assert_eq!(provenance.len(), 2);
    assert!(provenance.iter().all(|e| e.revision.revision == "g1"));
    assert!(resolved.is_consistent());
    assert_eq!(resolved.instance_of(&fp_of(&dep("a", "build"))).map(|i| i.counter), Some(1));
}

#[test]
fn newer_consistent_pair_beats_older_one() {
    let (f, git) = diamond();
    f.checkin(&git, &["g1", "g2", "g3"]);
    // Par viejo consistente: a1/b1 en g1. Par nuevo consistente: a3/b2 en g2.
    f.run_and_pass("a", 1, "build", &[Used::Rev(&git, "g1")]);
    f.run_and_pass("b", 1, "build", &[Used::Rev(&git, "g1")]);
    f.run_and_pass("a", 2, "build", &[Used::Rev(&git, "g2")]);
    f.run_and_pass("b", 2, "build", &[Used::Rev(&git, "g2")]);
    f.run_and_pass("a", 3, "build", &[Used::Rev(&git, "g3")]);

    let resolved = resolve(&f.graph("p"), &f.history, 100).expect("resolved");
    assert_eq!(resolved.instance_of(&fp_of(&dep("a", "build"))).map(|i| i.counter), Some(2));
    assert_eq!(resolved.instance_of(&fp_of(&dep("b", "build"))).map(|i| i.counter), Some(2));
    assert_eq!(resolved.revision_of(&git.fingerprint()).map(|r| r.revision.as_str()), Some("g2"));
}

#[test]
fn equally_stale_combinations_keep_earlier_declared_material_newest() {
    let (f, git) = diamond();
    f.checkin(&git, &["g1", "g2"]);
    // [0,0] = a2/b2 diverge; [0,1] = a2/b1 y [1,0] = a1/b2 convergen por igual.
    f.run_and_pass("a", 1, "build", &[Used::Rev(&git, "g1")]);
    f.run_and_pass("a", 2, "build", &[Used::Rev(&git, "g2")]);
    f.run_and_pass("b", 1, "build", &[Used::Rev(&git, "g2")]);
    f.run_and_pass("b", 2, "build", &[Used::Rev(&git, "g1")]);

    let resolved = resolve(&f.graph("p"), &f.history, 100).expect("resolved");
    assert_eq!(resolved.permutations_tried, 2);
    assert_eq!(resolved.instance_of(&fp_of(&dep("a", "build"))).map(|i| i.counter), Some(2));
    assert_eq!(resolved.instance_of(&fp_of(&dep("b", "build"))).map(|i| i.counter), Some(1));
    assert_eq!(resolved.revision_of(&git.fingerprint()).map(|r| r.revision.as_str()), Some("g2"));
}

#[test]
fn old_convergent_instance_is_found_within_limit() {
    let (f, git) = diamond();
    let revisions: Vec<String> = (1..=12).map(|i| format!("g{i}")).collect();
    let refs: Vec<&str> = revisions.iter().map(String::as_str).collect();
    f.checkin(&git, &refs);
    for (counter, rev) in (1..=12).zip(&refs) {
        f.run_and_pass("a", counter, "build", &[Used::Rev(&git, *rev)]);
    }
    f.run_and_pass("b", 1, "build", &[Used::Rev(&git, "g1")]);
    let graph = f.graph("p");

    let resolved = resolve(&graph, &f.history, 1000).expect("resolved");
    assert_eq!(resolved.permutations_tried, 12);
    assert_eq!(resolved.instance_of(&fp_of(&dep("a", "build"))).map(|i| i.counter), Some(1));
    assert_eq!(resolved.revision_of(&git.fingerprint()).map(|r| r.revision.as_str()), Some("g1"));

    // Un tope de historial que deja afuera a a1 no se confunde con "no hay
    // combinación".
    let capped = FanInResolver::new(1000).with_history_depth(5)
                                         .resolve(&graph, &f.history)
                                         .unwrap_err();
    assert_eq!(capped,
               ResolveError::Failure(FanInFailure::SearchSpaceTooLarge { limit: 1000,
                                                                        space: 12 }));
}

#[test]
fn shared_root_is_a_single_node() {
    let (f, git) = diamond();
    let graph = f.graph("p");
    assert_eq!(graph.roots().count(), 1);
    assert_eq!(graph.incoming(&git.fingerprint()).len(), 2);
    // Reconstruir da exactamente el mismo grafo.
    let again = f.graph("p");
    assert_eq!(graph.nodes.keys().collect::<Vec<_>>(), again.nodes.keys().collect::<Vec<_>>());
    assert_eq!(graph.edges, again.edges);
}

#[test]
fn unsatisfiable_graph_is_exhausted_or_truncated_depending_on_limit() {
    let (f, git) = diamond();
    f.checkin(&git, &["g1", "g2", "g3", "g4"]);
    f.run_and_pass("a", 1, "build", &[Used::Rev(&git, "g1")]);
    f.run_and_pass("a", 2, "build", &[Used::Rev(&git, "g2")]);
    f.run_and_pass("b", 1, "build", &[Used::Rev(&git, "g3")]);
    f.run_and_pass("b", 2, "build", &[Used::Rev(&git, "g4")]);
    let graph = f.graph("p");

    let exhausted = resolve(&graph, &f.history, 100).unwrap_err();
    assert_eq!(exhausted, ResolveError::Failure(FanInFailure::NoValidCombinationFound { tried: 4 }));

    let truncated = resolve(&graph, &f.history, 3).unwrap_err();
    assert_eq!(truncated,
               ResolveError::Failure(FanInFailure::SearchSpaceTooLarge { limit: 3,
                                                                        space: 4 }));

    // Con el límite exacto se recorre todo el espacio.
    let exact = resolve(&graph, &f.history, 4).unwrap_err();
    assert!(matches!(exact, ResolveError::Failure(FanInFailure::NoValidCombinationFound { .. })));
}

#[test]
fn missing_upstream_fails_before_any_revision_lookup() {
    let git = MaterialConfig::git("git-url");
    let mut f = Fixture::new();
    f.pipeline("up", vec![git.clone()]);
    f.pipeline("p", vec![git.clone(), dep("up", "build").into()]);
    f.checkin(&git, &["g1"]);
    // Corrió pero falló: no hay instancia elegible.
    f.run_and_fail("up", 1, &[Used::Rev(&git, "g1")]);

    let counting = CountingHistory::new(&f.history);
    let err = resolve(&f.graph("p"), &counting, 100).unwrap_err();
    assert_eq!(err,
               ResolveError::Failure(FanInFailure::UpstreamNotYetBuilt { pipeline: "up".into(),
                                                                        stage: "build".into() }));
    assert_eq!(counting.revision_calls.get(), 0);
}

#[test]
fn missing_transitive_upstream_is_detected_too() {
    let git = MaterialConfig::git("git-url");
    let mut f = Fixture::new();
    f.pipeline("root", vec![git.clone()]);
    f.pipeline("mid", vec![dep("root", "s").into()]);
    f.pipeline("p", vec![dep("mid", "s").into()]);
    f.run_and_pass("mid", 1, "s", &[]);

    let err = resolve(&f.graph("p"), &f.history, 100).unwrap_err();
    assert!(matches!(err, ResolveError::Failure(FanInFailure::UpstreamNotYetBuilt { ref pipeline, .. }) if pipeline.as_str() == "root"));
}

#[test]
fn repeated_resolution_is_identical() {
    let (f, git) = diamond();
    f.checkin(&git, &["g1", "g2"]);
    for c in 1..=3 {
        f.run_and_pass("a", c, "build", &[Used::Rev(&git, if c == 2 { "g2" } else { "g1" })]);
    }
    f.run_and_pass("b", 1, "build", &[Used::Rev(&git, "g2")]);
    f.run_and_pass("b", 2, "build", &[Used::Rev(&git, "g1")]);

    let graph = f.graph("p");
    let first = resolve(&graph, &f.history, 100).expect("first");
    for _ in 0..5 {
        let again = resolve(&f.graph("p"), &f.history, 100).expect("again");
        assert_eq!(first, again);
        assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&again).unwrap());
    }
}

#[test]
fn resolver_instance_is_reusable_across_targets() {
    let (mut f, git) = diamond();
    f.pipeline("solo", vec![git.clone()]);
    f.checkin(&git, &["g1"]);
    f.run_and_pass("a", 1, "build", &[Used::Rev(&git, "g1")]);
    f.run_and_pass("b", 1, "build", &[Used::Rev(&git, "g1")]);

    let resolver = FanInResolver::new(10).with_history_depth(5);
    assert!(resolver.resolve(&f.graph("p"), &f.history).is_ok());
    assert!(resolver.resolve(&f.graph("solo"), &f.history).is_ok());
}
