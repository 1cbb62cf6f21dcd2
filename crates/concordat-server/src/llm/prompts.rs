//! Prompt rendering for the three generation paths.
//!
//! Each prompt kind is a typed variant with a pure rendering function, so
//! there is exactly one template per path and the compiler knows which
//! parameters each one needs.

use serde::Serialize;

use concordat_protocol::{AdvisorContext, GameDate, TurnContext, WorldEvent};

/// A rendered prompt: system instruction plus the user turn that carries the
/// request payload. Diplomatic prompts additionally splice the chat
/// transcript between the two (the client owns that assembly).
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Parameters for a diplomatic reply prompt.
#[derive(Clone, Debug)]
pub struct DiplomacyParams<'a> {
    /// Display names of every chat participant, joined for the roster line.
    pub participants: String,
    /// The player polity's display name.
    pub player_name: &'a str,
    /// The polity speaking in this reply.
    pub responding_name: &'a str,
    pub current_date: GameDate,
    /// Character-count target for the reply. The ±10% tolerance lives in
    /// the prompt text; nothing is enforced locally.
    pub reply_target_chars: usize,
    pub world_context: &'a str,
    pub simulation_rules: &'a str,
    pub recent_events: &'a [WorldEvent],
    /// The incoming message being replied to.
    pub message: &'a str,
}

/// The three prompt kinds the generation client can issue.
#[derive(Clone, Debug)]
pub enum Prompt<'a> {
    /// Turn-event generation: the game-master simulation step.
    TurnEvents(&'a TurnContext),
    /// Advisor Q&A for the player's nation.
    Advisor {
        question: &'a str,
        context: &'a AdvisorContext,
    },
    /// A single nation's reply in a diplomatic chat.
    DiplomaticReply(DiplomacyParams<'a>),
}

impl Prompt<'_> {
    pub fn render(&self) -> RenderedPrompt {
        match self {
            Prompt::TurnEvents(ctx) => render_turn_events(ctx),
            Prompt::Advisor { question, context } => render_advisor(question, context),
            Prompt::DiplomaticReply(params) => render_diplomacy(params),
        }
    }
}

fn json_block<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

fn render_turn_events(ctx: &TurnContext) -> RenderedPrompt {
    let system = format!(
        "You are the Game Master of a 1935-1945 grand strategy simulation.\n\
         YOUR ROLE: you are the architect of consequence. Work out the fallout of the \
         player's actions and generate realistic world events.\n\
         \n\
         SIMULATION RULES:\n\
         1. CONSEQUENCE: every action has weight. If one power attacks another, its rivals react. \
         Mobilization raises tensions.\n\
         2. DYNAMIC HISTORICAL REALISM: follow history but allow plausible deviations. Never block \
         the player; reward or punish them with realistic events.\n\
         3. GEOGRAPHIC SPECIFICITY: name real cities, rivers, and commanders, never vague \
         \"the army advances\".\n\
         4. NATION TAGS: always refer to nations by their three-letter tag (e.g. [{player_code}]).\n\
         \n\
         WORLD CONTEXT: {world_context}\n\
         \n\
         RESPONSE FORMAT (JSON):\n\
         {{\n\
           \"events\": [\n\
             {{\n\
               \"title\": \"...\",\n\
               \"description\": \"...\",\n\
               \"event_type\": \"political|military|economic|diplomatic|social\",\n\
               \"severity\": \"minor|moderate|major|critical\",\n\
               \"affected_nations\": [\"GER\", \"ITA\"],\n\
               \"state_changes\": {{\n\
                 \"NATION_CODE\": {{\n\
                   \"stability\": -5,\n\
                   \"war_support\": 10,\n\
                   \"treasury\": -200,\n\
                   \"occupied_regions\": [\"REGION_ID\"]\n\
                 }}\n\
               }}\n\
             }}\n\
           ],\n\
           \"global_tension_delta\": 0\n\
         }}\n\
         Use exactly the keys \"events\", \"title\", \"description\", \"event_type\", \
         \"severity\", \"affected_nations\" and \"state_changes\".\n\
         IMPORTANT: never prefix positive numbers with '+' in the JSON (write 5, not +5).",
        player_code = ctx.player_nation_code,
        world_context = ctx.world_context,
    );

    let user = format!(
        "TURN SIMULATION:\n\
         Time jump: {jump}\n\
         Start date: {date}\n\
         Player nation: {player}\n\
         \n\
         PLAYER'S PENDING ACTIONS:\n{actions}\n\
         \n\
         RECENT EVENT HISTORY:\n{events}\n\
         \n\
         WORLD STATE:\n{world}\n\
         \n\
         SIMULATION RULES:\n{rules}\n\
         \n\
         Generate 3-6 significant events and their consequences for this period ({jump}). \
         Every event must be realistic, impactful, and consistent with the current situation.\n\
         Respond ONLY with JSON in the required format.",
        jump = ctx.time_jump,
        date = ctx.current_date,
        player = ctx.player_nation_name,
        actions = json_block(&ctx.pending_actions),
        events = json_block(&ctx.recent_events),
        world = json_block(&ctx.world_state),
        rules = ctx.simulation_rules,
    );

    RenderedPrompt { system, user }
}

fn render_advisor(question: &str, ctx: &AdvisorContext) -> RenderedPrompt {
    let system = format!(
        "You are the High Strategic Advisor of {nation} on {date}.\n\
         YOUR MANDATE: provide cold, precise, historically grounded analysis: a strategic \
         compass that helps the leader avoid past failures and pursue national goals wisely.\n\
         \n\
         IRON RULES:\n\
         1. REAL GEOGRAPHY: anchor every recommendation to real places.\n\
         2. MISTAKE PREVENTION: when the player is heading down a road that historically led to \
         disaster, say so firmly.\n\
         3. TAGS: always use three-letter [TAG]s for nations.\n\
         4. CONCISE MODE: if the player sends only a brief informal message (\"OK\", \"understood\"), \
         reply with one very short sentence instead of the full format.",
        nation = ctx.player_nation.name,
        date = ctx.current_date,
    );

    let user = format!(
        "CURRENT SITUATION ({date}):\n\
         Nation: {name} ({code})\n\
         At war: {at_war}\n\
         Occupied regions: {occupied}\n\
         \n\
         WORLD STATE (relevant nations):\n{world}\n\
         \n\
         LATEST WORLD EVENTS:\n{events}\n\
         \n\
         PLAYER ACTIONS IN PROGRESS:\n{actions}\n\
         \n\
         THE SOVEREIGN ASKS: \"{question}\"",
        date = ctx.current_date,
        name = ctx.player_nation.name,
        code = ctx.player_nation.code,
        at_war = if ctx.player_nation.at_war { "yes" } else { "no" },
        occupied = if ctx.player_nation.occupied_regions.is_empty() {
            "none".to_string()
        } else {
            ctx.player_nation.occupied_regions.join(", ")
        },
        world = json_block(&ctx.world_state),
        events = json_block(&ctx.recent_events),
        actions = json_block(&ctx.pending_actions),
    );

    RenderedPrompt { system, user }
}

fn render_diplomacy(params: &DiplomacyParams<'_>) -> RenderedPrompt {
    let system = format!(
        "You are simulating diplomacy in a turn-based strategy game by roleplaying the \
         polities in this chat.\n\
         \n\
         PARTICIPANTS: {participants}\n\
         PLAYER POLITY: {player}\n\
         CURRENT DATE: {date}\n\
         \n\
         Roleplay instructions:\n\
         1. PROFESSIONALISM: you are a competent polity. No nonsense, straight to the point.\n\
         2. OPEN-MINDEDNESS: be receptive to propositions, but always move toward a solid \
         answer (accept/refuse).\n\
         3. TONE MATCHING: match the player's tone, leaning professional over slang.\n\
         4. No third-person speaking, no stray symbols or hashtags.\n\
         \n\
         Output length rule (CRITICAL):\n\
         Your message must always match the average size of the player's messages in this \
         chat: {target} characters, plus or minus 10 percent. NEVER BREAK THIS RULE.\n\
         \n\
         World context:\n{world_context}\n\
         \n\
         Simulation rules:\n{rules}\n\
         \n\
         Current event history:\n{events}\n\
         \n\
         Responding as: {responder}",
        participants = params.participants,
        player = params.player_name,
        date = params.current_date,
        target = params.reply_target_chars,
        world_context = params.world_context,
        rules = params.simulation_rules,
        events = json_block(&params.recent_events),
        responder = params.responding_name,
    );

    RenderedPrompt {
        system,
        user: params.message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concordat_protocol::{NationCode, PlayerBrief, TimeJump};
    use std::collections::BTreeMap;

    fn turn_context() -> TurnContext {
        TurnContext {
            time_jump: TimeJump::Week,
            current_date: GameDate::from_ymd_opt(1936, 1, 1).unwrap(),
            player_nation_code: NationCode::new("ITA"),
            player_nation_name: "Italy".to_string(),
            pending_actions: vec![],
            recent_events: vec![],
            world_state: BTreeMap::new(),
            world_context: "A tense winter.".to_string(),
            simulation_rules: "Be realistic.".to_string(),
        }
    }

    #[test]
    fn turn_prompt_carries_context_and_format_contract() {
        let ctx = turn_context();
        let rendered = Prompt::TurnEvents(&ctx).render();

        assert!(rendered.system.contains("A tense winter."));
        assert!(rendered.system.contains("\"events\""));
        assert!(rendered.system.contains("never prefix positive numbers"));
        assert!(rendered.user.contains("Time jump: 1_week"));
        assert!(rendered.user.contains("Player nation: Italy"));
        assert!(rendered.user.contains("Be realistic."));
    }

    #[test]
    fn advisor_prompt_names_the_nation() {
        let ctx = AdvisorContext {
            current_date: GameDate::from_ymd_opt(1936, 3, 7).unwrap(),
            turn_number: 4,
            player_nation: PlayerBrief {
                code: NationCode::new("ETH"),
                name: "Ethiopia".to_string(),
                at_war: true,
                occupied_regions: vec![],
            },
            world_state: BTreeMap::new(),
            recent_events: vec![],
            pending_actions: vec![],
            world_context: String::new(),
            simulation_rules: String::new(),
        };
        let rendered = Prompt::Advisor {
            question: "Should we fortify the passes?",
            context: &ctx,
        }
        .render();

        assert!(rendered.system.contains("High Strategic Advisor of Ethiopia"));
        assert!(rendered.user.contains("At war: yes"));
        assert!(rendered.user.contains("Should we fortify the passes?"));
    }

    #[test]
    fn diplomacy_prompt_embeds_length_target() {
        let params = DiplomacyParams {
            participants: "Italy, Germany".to_string(),
            player_name: "Italy",
            responding_name: "Germany",
            current_date: GameDate::from_ymd_opt(1936, 1, 1).unwrap(),
            reply_target_chars: 40,
            world_context: "ctx",
            simulation_rules: "rules",
            recent_events: &[],
            message: "We propose a trade agreement.",
        };
        let rendered = Prompt::DiplomaticReply(params).render();

        assert!(rendered.system.contains("40 characters, plus or minus 10 percent"));
        assert!(rendered.system.contains("Responding as: Germany"));
        assert_eq!(rendered.user, "We propose a trade agreement.");
    }
}
