// Scenario tests for discrimination tests
//
// Panels sized like real sensory studies (30 to 100 assessors) on every
// protocol, checking the estimates, intervals and test decisions end to end.

use super::*;
use crate::error::DiscriminationError;
use crate::method::DiscriminationMethod;
use crate::mplusn::MonteCarloConfig;
use crate::protocol::Protocol;

fn method(protocol: Protocol) -> DiscriminationMethod {
    DiscriminationMethod::new(protocol).unwrap()
}

fn quick_config() -> MonteCarloConfig {
    MonteCarloConfig {
        steps: 51,
        sample_size: 20_000,
        ..MonteCarloConfig::default()
    }
}

fn all_methods() -> Vec<DiscriminationMethod> {
    let mut methods: Vec<_> = [
        Protocol::Triangle,
        Protocol::TwoAfc,
        Protocol::ThreeAfc,
        Protocol::FourAfc,
        Protocol::MultipleAfc { m: 10 },
        Protocol::SpecifiedTetrad,
        Protocol::UnspecifiedTetrad,
        Protocol::DualPair,
        Protocol::DuoTrio,
    ]
    .into_iter()
    .map(method)
    .collect();

    for spec in ["mplusn:m=4,n=3", "mplusn:m=4,n=3,specified", "mplusn:m=2,n=2"] {
        methods.push(DiscriminationMethod::from_spec(spec, &quick_config()).unwrap());
    }
    methods
}

fn assert_interval(name: &str, stat: &Statistic) {
    assert!(
        stat.lower <= stat.estimate + 1e-9 && stat.estimate <= stat.upper + 1e-9,
        "{name}: {stat:?}"
    );
}

/// Scenario: 19 of 30 assessors pick the odd sample in a triangle test
/// Expected: clear difference, d' a little above 2
#[test]
fn test_triangle_19_of_30_difference() {
    let triangle = method(Protocol::Triangle);
    let results = DiscriminationTest::new(&triangle)
        .difference(19, 30, 0.0, 0.95)
        .unwrap();

    assert!((results.pc.estimate - 19.0 / 30.0).abs() < 1e-12);
    assert!((results.pg - 1.0 / 3.0).abs() < 1e-15);
    assert!((results.pd.estimate - 0.45).abs() < 1e-12);
    assert!(results.d_prime.estimate > 2.0 && results.d_prime.estimate < 2.3);

    assert!((results.p_value - 0.000_737).abs() < 1e-5, "p = {}", results.p_value);
    assert_eq!(results.critical_value, Some(15));
    assert!((results.power - 0.9538).abs() < 1e-3, "power = {}", results.power);
    assert!(results.is_significant());

    assert!((results.pc.lower - 0.4386).abs() < 1e-3);
    assert!((results.pc.upper - 0.8007).abs() < 1e-3);
    assert!((results.alpha - 0.05).abs() < 1e-12);
}

/// Both kinds share one estimate and interval computation
#[test]
fn test_difference_and_equivalence_agree_on_estimates() {
    let triangle = method(Protocol::Triangle);
    let test = DiscriminationTest::new(&triangle);
    let difference = test.difference(19, 30, 0.0, 0.95).unwrap();
    let equivalence = test.equivalence(19, 30, 0.0, 0.95).unwrap();

    assert_eq!(difference.pc, equivalence.pc);
    assert_eq!(difference.pd, equivalence.pd);
    assert_eq!(difference.d_prime, equivalence.d_prime);
    assert_eq!(difference.kind, TestKind::Difference);
    assert_eq!(equivalence.kind, TestKind::Equivalence);
    assert!((difference.p_value - equivalence.p_value).abs() > 0.5);
}

/// Scenario: reformulated product, 12 of 30 correct, "similar" means pd < 50%
/// Expected: equivalence established
#[test]
fn test_triangle_equivalence_with_threshold() {
    let triangle = method(Protocol::Triangle);
    let results = DiscriminationTest::new(&triangle)
        .equivalence(12, 30, 0.5, 0.95)
        .unwrap();

    assert!((results.pc0 - 2.0 / 3.0).abs() < 1e-12);
    assert!((results.p_value - 0.002_458).abs() < 1e-5, "p = {}", results.p_value);
    assert_eq!(results.critical_value, Some(15));
    assert!(results.is_significant());

    let not_similar = DiscriminationTest::new(&triangle)
        .equivalence(19, 30, 0.5, 0.95)
        .unwrap();
    assert!(!not_similar.is_significant());
}

#[test]
fn test_every_protocol_end_to_end() {
    for method in all_methods() {
        let test = DiscriminationTest::new(&method);
        for kind in [TestKind::Difference, TestKind::Equivalence] {
            let results = test.run(kind, 19, 30, &TestConfig::default()).unwrap();
            let name = method.name();

            assert!((results.pc.estimate - 19.0 / 30.0).abs() < 1e-12, "{name}");
            assert!(results.pc.lower >= results.pg, "{name}");
            assert!(results.pc.upper <= 1.0, "{name}");
            assert_interval(&name, &results.pc);
            assert_interval(&name, &results.pd);
            assert_interval(&name, &results.d_prime);
            assert!((0.0..=1.0).contains(&results.p_value), "{name}");
            assert!((0.0..=1.0).contains(&results.power), "{name}");
        }
    }
}

#[test]
fn test_power_grows_with_panel_size() {
    let triangle = method(Protocol::Triangle);
    let test = DiscriminationTest::new(&triangle);
    let config = TestConfig::default();

    // Same observed pc = 0.5 on growing panels
    let powers: Vec<f64> = [(5, 10), (15, 30), (50, 100), (150, 300)]
        .into_iter()
        .map(|(x, n)| test.run(TestKind::Difference, x, n, &config).unwrap().power)
        .collect();
    assert!(powers.windows(2).all(|w| w[1] > w[0]), "{powers:?}");
    assert!(powers[3] > 0.99);
}

#[test]
fn test_equivalence_power_grows_with_distance_from_threshold() {
    let triangle = method(Protocol::Triangle);
    let test = DiscriminationTest::new(&triangle);
    let config = TestConfig::new(0.5, 0.95).unwrap();

    // pc0 = 2/3; observed pc further below it should give more power
    let near = test.run(TestKind::Equivalence, 55, 100, &config).unwrap();
    let far = test.run(TestKind::Equivalence, 40, 100, &config).unwrap();
    assert!(far.power > near.power);
    assert!(far.power > 0.99);
}

#[test]
fn test_chance_performance_gives_zero_d_prime() {
    let two_afc = method(Protocol::TwoAfc);
    let results = DiscriminationTest::new(&two_afc)
        .difference(15, 30, 0.0, 0.95)
        .unwrap();
    assert_eq!(results.d_prime.estimate, 0.0);
    assert_eq!(results.d_prime.lower, 0.0);
    assert_eq!(results.pd.estimate, 0.0);
    assert!(!results.is_significant());
}

/// The duo-trio curve is flat at d = 0, so the delta method breaks down
#[test]
fn test_flat_slope_gives_unbounded_d_prime_error() {
    let duo_trio = method(Protocol::DuoTrio);
    let results = DiscriminationTest::new(&duo_trio)
        .difference(15, 30, 0.0, 0.95)
        .unwrap();
    assert_eq!(results.d_prime.estimate, 0.0);
    assert!(!results.d_prime.stderr.is_finite() || results.d_prime.stderr.abs() > 1e3);
}

#[test]
fn test_below_chance_fails_to_converge() {
    let triangle = method(Protocol::Triangle);
    let err = DiscriminationTest::new(&triangle)
        .difference(5, 30, 0.0, 0.95)
        .unwrap_err();
    assert!(matches!(err, DiscriminationError::NoConvergence(_)));
}

#[test]
fn test_perfect_score_fails_to_converge() {
    let triangle = method(Protocol::Triangle);
    let err = DiscriminationTest::new(&triangle)
        .difference(30, 30, 0.0, 0.95)
        .unwrap_err();
    assert!(matches!(err, DiscriminationError::NoConvergence(_)));
}

#[test]
fn test_invalid_inputs_rejected() {
    let triangle = method(Protocol::Triangle);
    let test = DiscriminationTest::new(&triangle);

    for result in [
        test.difference(1, 0, 0.0, 0.95),
        test.difference(31, 30, 0.0, 0.95),
        test.difference(19, 30, 1.0, 0.95),
        test.equivalence(19, 30, 0.0, 1.0),
        test.equivalence(19, 30, -0.2, 0.95),
    ] {
        assert!(matches!(
            result,
            Err(DiscriminationError::InvalidParameter(_))
        ));
    }
}

#[test]
fn test_stricter_confidence_widens_intervals() {
    let tetrad = method(Protocol::UnspecifiedTetrad);
    let test = DiscriminationTest::new(&tetrad);
    let loose = test
        .run(TestKind::Difference, 40, 70, &TestConfig::permissive())
        .unwrap();
    let strict = test
        .run(TestKind::Difference, 40, 70, &TestConfig::strict())
        .unwrap();

    assert!(strict.pc.lower < loose.pc.lower);
    assert!(strict.pc.upper > loose.pc.upper);
    assert!(strict.d_prime.upper > loose.d_prime.upper);
}
