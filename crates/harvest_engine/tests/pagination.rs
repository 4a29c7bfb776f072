mod support;

use harvest_core::{update, Effect, ExclusionSet, ItemOutcome, Msg, RunState};
use harvest_engine::{DriverError, EngineError, ManualClock, OuterPager, PagerSettings, Round, Selectors};
use pretty_assertions::assert_eq;
use support::{init_logging, secs, test_config, FakeUi};

#[tokio::test]
async fn listing_drops_noise_and_trims_titles() {
    init_logging();
    let ui = FakeUi::new(&["Ana", "Archivados", "", "  Bea  "]);
    let clock = ManualClock::new();
    let (selectors, settings) = (Selectors::default(), PagerSettings::default());
    let pager = OuterPager::new(&ui, &clock, &selectors, &settings);

    assert_eq!(pager.list_visible().await.unwrap(), vec!["Ana", "Bea"]);
}

#[tokio::test]
async fn listing_skips_reserved_multiline_and_repeated_titles() {
    init_logging();
    let ui = FakeUi::new(&["WhatsApp", "Ana", "primera\nsegunda", "Ana"]);
    let clock = ManualClock::new();
    let (selectors, settings) = (Selectors::default(), PagerSettings::default());
    let pager = OuterPager::new(&ui, &clock, &selectors, &settings);

    assert_eq!(pager.list_visible().await.unwrap(), vec!["Ana"]);
}

#[tokio::test]
async fn finite_list_is_exhausted_within_n_plus_one_rounds() {
    init_logging();
    let labels: Vec<String> = (0..10).map(|i| format!("Chat {i}")).collect();
    let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let ui = FakeUi::new(&refs);
    let clock = ManualClock::new();
    let config = test_config();
    let pager = OuterPager::new(&ui, &clock, &config.selectors, &config.pager);

    let mut state = RunState::new(100, ExclusionSet::default());
    let mut rounds = 0;
    loop {
        let labels = match pager.next_round(&state).await.unwrap() {
            Round::Fresh(labels) => labels,
            Round::Exhausted => break,
        };
        rounds += 1;
        assert!(rounds <= 11, "pagination did not converge");
        let (next, effects) = update(state, Msg::RoundListed { labels });
        state = next;
        for effect in effects {
            if let Effect::Harvest { label } = effect {
                let outcome = ItemOutcome::Harvested(Vec::new());
                state = update(state, Msg::ItemFinished { label, outcome }).0;
            }
        }
        pager.advance().await.unwrap();
    }

    assert_eq!(state.processed_labels(), labels.as_slice());
    assert_eq!(rounds, 3);
}

#[tokio::test]
async fn missing_outer_list_is_a_structural_error() {
    init_logging();
    let ui = FakeUi::new(&["Ana"]).without_outer_list();
    let clock = ManualClock::new();
    let (selectors, settings) = (Selectors::default(), PagerSettings::default());
    let pager = OuterPager::new(&ui, &clock, &selectors, &settings);

    let err = pager.list_visible().await.unwrap_err();

    assert_eq!(
        err,
        EngineError::StructuralNotReady {
            what: "outer list container".to_string(),
            waited: secs(20),
        }
    );
}

#[tokio::test]
async fn open_matches_the_whole_title() {
    init_logging();
    let ui = FakeUi::new(&["Ana María", "Ana"]);
    let clock = ManualClock::new();
    let (selectors, settings) = (Selectors::default(), PagerSettings::default());
    let pager = OuterPager::new(&ui, &clock, &selectors, &settings);

    pager.open("Ana").await.unwrap();

    assert_eq!(ui.opened(), vec!["Ana"]);
}

#[tokio::test]
async fn open_gives_up_when_the_row_is_gone() {
    init_logging();
    let ui = FakeUi::new(&["Ana"]);
    let clock = ManualClock::new();
    let (selectors, settings) = (Selectors::default(), PagerSettings::default());
    let pager = OuterPager::new(&ui, &clock, &selectors, &settings);

    let err = pager.open("Bea").await.unwrap_err();

    assert!(matches!(err, DriverError::NotFound { .. }));
    assert!(ui.opened().is_empty());
}
