//! End-to-end service tests against a scripted generation backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use concordat_core::{NationRegistry, SaveStore};
use concordat_protocol::{AdvisorContext, ChatMessage, NationCode, NationInfo, TurnContext};
use concordat_server::game::GameService;
use concordat_server::llm::prompts::DiplomacyParams;
use concordat_server::llm::{parse_turn_generation, GenerationError, Generator, TurnOutcome};
use concordat_server::notify::Notifier;
use concordat_server::ServiceError;

/// Replays canned raw responses through the real parsing pipeline and
/// records what it was asked.
#[derive(Default)]
struct ScriptedGenerator {
    turn_scripts: Mutex<VecDeque<String>>,
    failing_diplomats: Vec<String>,
    seen_reply_targets: Mutex<Vec<usize>>,
    seen_event_windows: Mutex<Vec<usize>>,
}

impl ScriptedGenerator {
    fn with_turn_script(raw: &str) -> Self {
        let generator = Self::default();
        generator
            .turn_scripts
            .lock()
            .unwrap()
            .push_back(raw.to_string());
        generator
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn turn_events(&self, _ctx: &TurnContext) -> Result<TurnOutcome, GenerationError> {
        let script = self
            .turn_scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| r#"{"events": []}"#.to_string());
        Ok(parse_turn_generation(&script))
    }

    async fn advisor(
        &self,
        _question: &str,
        ctx: &AdvisorContext,
    ) -> Result<String, GenerationError> {
        Ok(format!("Advice for {}", ctx.player_nation.name))
    }

    async fn diplomatic_reply(
        &self,
        params: DiplomacyParams<'_>,
        _transcript: &[ChatMessage],
    ) -> Result<String, GenerationError> {
        self.seen_reply_targets
            .lock()
            .unwrap()
            .push(params.reply_target_chars);
        self.seen_event_windows
            .lock()
            .unwrap()
            .push(params.recent_events.len());
        if self
            .failing_diplomats
            .iter()
            .any(|name| name == params.responding_name)
        {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(format!("{} acknowledges.", params.responding_name))
    }
}

fn nation(code: &str, name: &str, major: bool) -> NationInfo {
    NationInfo {
        code: NationCode::new(code),
        name: name.to_string(),
        color: None,
        leader_name: None,
        leader_title: None,
        ideology: None,
        is_major_power: major,
        manpower: None,
    }
}

fn registry() -> Arc<NationRegistry> {
    Arc::new(NationRegistry::from_entries([
        nation("ITA", "Italy", true),
        nation("GER", "Germany", true),
        nation("ETH", "Ethiopia", false),
    ]))
}

fn service_with(generator: ScriptedGenerator) -> (GameService, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = SaveStore::open(dir.path()).unwrap();
    let service = GameService::new(registry(), store, Arc::new(generator), Notifier::default());
    (service, dir)
}

#[tokio::test]
async fn turn_advances_even_when_generation_is_empty() {
    let (service, _dir) = service_with(ScriptedGenerator::default());
    let save = service.create_game("ITA", None).await.unwrap();
    assert_eq!(save.turn_number, 1);

    let report = service.advance_time(&save.id, "1_month").await.unwrap();
    assert_eq!(report.turn_number, 2);
    assert!(report.events.is_empty());
    assert!(report.degraded.is_none());
    assert!(report.new_date > report.previous_date);

    let reloaded = service.load_game(&save.id).unwrap();
    assert_eq!(reloaded.save.turn_number, 2);
    assert_eq!(reloaded.save.current_date, report.new_date);
    assert_eq!(reloaded.player_nation.unwrap().name, "Italy");
}

#[tokio::test]
async fn malformed_generation_degrades_but_the_clock_still_moves() {
    let (service, _dir) =
        service_with(ScriptedGenerator::with_turn_script("no json here, sorry"));
    let save = service.create_game("ITA", None).await.unwrap();

    let report = service.advance_time(&save.id, "1_week").await.unwrap();
    assert!(report.degraded.is_some());
    assert!(report.events.is_empty());
    assert_eq!(report.turn_number, 2);
}

#[tokio::test]
async fn generated_state_changes_are_applied_and_events_logged() {
    let script = r#"```json
    {
        "events": [{
            "title": "Sanctions Bite",
            "description": "League sanctions squeeze the Italian economy.",
            "event_type": "economic",
            "severity": "major",
            "affected_nations": ["ITA"],
            "state_changes": {
                "ITA": {"stability": +5, "treasury": -200},
                "ZZZ": {"stability": -50}
            }
        }],
        "global_tension_delta": +2
    }
    ```"#;
    let (service, _dir) = service_with(ScriptedGenerator::with_turn_script(script));
    let save = service.create_game("ITA", None).await.unwrap();

    let report = service.advance_time(&save.id, "1_month").await.unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.global_tension_delta, 2.0);
    assert!(report.degraded.is_none());

    let reloaded = service.load_game(&save.id).unwrap().save;
    let ita = &reloaded.nations[&NationCode::new("ITA")];
    assert_eq!(ita.stability, 75.0);
    assert_eq!(ita.treasury, 800);
    assert_eq!(reloaded.events.len(), 1);
    // The event is stamped with the turn it resolved and the date that turn
    // started from, not the post-advance date.
    assert_eq!(reloaded.events[0].turn_number, 1);
    assert_eq!(
        reloaded.events[0].game_date,
        concordat_protocol::GameDate::from_ymd_opt(1936, 1, 1).unwrap()
    );
    assert!(reloaded.events[0].game_date < reloaded.current_date);
}

#[tokio::test]
async fn pending_actions_complete_on_advance_and_new_ones_stay_pending() {
    let (service, _dir) = service_with(ScriptedGenerator::default());
    let save = service.create_game("ETH", None).await.unwrap();

    let first = service
        .submit_action(&save.id, "Fortify the northern passes", None)
        .await
        .unwrap();
    assert_eq!(first.turn_number, 1);

    let report = service.advance_time(&save.id, "1_week").await.unwrap();
    assert_eq!(report.processed_actions, 1);
    assert!(service.pending_actions(&save.id).unwrap().is_empty());

    let second = service
        .submit_action(&save.id, "Request foreign volunteers", None)
        .await
        .unwrap();
    assert_eq!(second.turn_number, 2);
    assert_eq!(service.pending_actions(&save.id).unwrap().len(), 1);
}

#[tokio::test]
async fn completed_actions_cannot_be_withdrawn() {
    let (service, _dir) = service_with(ScriptedGenerator::default());
    let save = service.create_game("ITA", None).await.unwrap();

    let action = service
        .submit_action(&save.id, "Expand the fleet", None)
        .await
        .unwrap();
    service.advance_time(&save.id, "1_week").await.unwrap();

    let err = service.delete_action(&save.id, &action.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    // The action itself is still in the log, just completed.
    assert_eq!(service.actions(&save.id).unwrap().len(), 1);
}

#[tokio::test]
async fn pending_actions_can_be_withdrawn() {
    let (service, _dir) = service_with(ScriptedGenerator::default());
    let save = service.create_game("ITA", None).await.unwrap();

    let action = service
        .submit_action(&save.id, "Withdraw me", None)
        .await
        .unwrap();
    service.delete_action(&save.id, &action.id).await.unwrap();
    assert!(service.actions(&save.id).unwrap().is_empty());
}

#[tokio::test]
async fn diplomatic_replies_carry_the_player_length_target() {
    let generator = Arc::new(ScriptedGenerator::default());
    let dir = tempfile::tempdir().unwrap();
    let store = SaveStore::open(dir.path()).unwrap();
    let service = GameService::new(
        registry(),
        store,
        Arc::clone(&generator) as Arc<dyn Generator>,
        Notifier::default(),
    );
    let save = service.create_game("ITA", None).await.unwrap();

    let chat = service
        .start_chat(&save.id, &["GER".to_string()], Some("Trade"))
        .await
        .unwrap();

    let message = "We propose a steel-for-coal arrangement."; // 40 chars
    let replies = service
        .post_message(&save.id, &chat.id, message)
        .await
        .unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].message_text, "Germany acknowledges.");
    assert!(!replies[0].sender_is_player);

    // First exchange: the target handed to the generator is the incoming
    // message's length.
    assert_eq!(
        *generator.seen_reply_targets.lock().unwrap(),
        vec![message.chars().count()]
    );

    let reloaded = service.chat_detail(&save.id, &chat.id).unwrap();
    assert_eq!(reloaded.chat.messages.len(), 2);
    assert_eq!(
        reloaded.chat.player_average_length(0),
        message.chars().count()
    );
}

#[tokio::test]
async fn failed_diplomat_becomes_a_communication_error_message() {
    let generator = ScriptedGenerator {
        failing_diplomats: vec!["Germany".to_string()],
        ..Default::default()
    };
    let (service, _dir) = service_with(generator);
    let save = service.create_game("ITA", None).await.unwrap();

    let chat = service
        .start_chat(&save.id, &["GER".to_string(), "ETH".to_string()], None)
        .await
        .unwrap();
    assert_eq!(
        chat.chat_type,
        concordat_protocol::ChatType::Conference
    );

    let replies = service
        .post_message(&save.id, &chat.id, "A three-way pact?")
        .await
        .unwrap();
    assert_eq!(replies.len(), 2);
    assert!(replies
        .iter()
        .any(|r| r.message_text.starts_with("[Communication Error:")));
    assert!(replies
        .iter()
        .any(|r| r.message_text == "Ethiopia acknowledges."));
}

#[tokio::test]
async fn diplomacy_prompts_see_a_deeper_event_history_than_turns() {
    let generator = Arc::new(ScriptedGenerator::default());
    for _ in 0..25 {
        generator
            .turn_scripts
            .lock()
            .unwrap()
            .push_back(r#"{"events": [{"title": "Skirmish"}]}"#.to_string());
    }
    let dir = tempfile::tempdir().unwrap();
    let store = SaveStore::open(dir.path()).unwrap();
    let service = GameService::new(
        registry(),
        store,
        Arc::clone(&generator) as Arc<dyn Generator>,
        Notifier::default(),
    );
    let save = service.create_game("ITA", None).await.unwrap();
    for _ in 0..25 {
        service.advance_time(&save.id, "1_week").await.unwrap();
    }

    let chat = service
        .start_chat(&save.id, &["GER".to_string()], None)
        .await
        .unwrap();
    service
        .post_message(&save.id, &chat.id, "How do you read the situation?")
        .await
        .unwrap();

    assert_eq!(*generator.seen_event_windows.lock().unwrap(), vec![20]);
}

#[tokio::test]
async fn closed_chats_reject_messages_but_stay_readable() {
    let (service, _dir) = service_with(ScriptedGenerator::default());
    let save = service.create_game("ITA", None).await.unwrap();

    let chat = service
        .start_chat(&save.id, &["GER".to_string()], None)
        .await
        .unwrap();
    service
        .post_message(&save.id, &chat.id, "Greetings.")
        .await
        .unwrap();
    service.close_chat(&save.id, &chat.id).await.unwrap();

    assert!(service.list_chats(&save.id).unwrap().is_empty());
    let err = service
        .post_message(&save.id, &chat.id, "Hello again?")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let detail = service.chat_detail(&save.id, &chat.id).unwrap();
    assert!(!detail.chat.is_active);
    assert_eq!(detail.chat.messages.len(), 2);
}

#[tokio::test]
async fn unit_listing_filters_and_moves_update_regions() {
    let (service, _dir) = service_with(ScriptedGenerator::default());
    let save = service.create_game("ITA", None).await.unwrap();

    let all = service.units(&save.id, None, None).unwrap();
    assert!(!all.is_empty());

    let italian = service.units(&save.id, Some("ita"), None).unwrap();
    assert!(!italian.is_empty());
    assert!(italian.iter().all(|u| u.nation_code == NationCode::new("ITA")));
    assert!(italian.len() < all.len());

    let moved = service
        .move_unit(&save.id, &italian[0].id, "Makale", None)
        .await
        .unwrap();
    assert_eq!(moved.region_id, "Makale");
    assert!(moved.updated_at.is_some());

    let in_makale = service.units(&save.id, None, Some("Makale")).unwrap();
    assert_eq!(in_makale.len(), 1);
}

#[tokio::test]
async fn create_game_rejects_unknown_nations() {
    let (service, _dir) = service_with(ScriptedGenerator::default());
    let err = service.create_game("XYZ", None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn advisor_answers_in_context() {
    let (service, _dir) = service_with(ScriptedGenerator::default());
    let save = service.create_game("ETH", None).await.unwrap();

    let reply = service
        .ask_advisor(&save.id, "How do we survive?")
        .await
        .unwrap();
    assert_eq!(reply, "Advice for Ethiopia");
}
