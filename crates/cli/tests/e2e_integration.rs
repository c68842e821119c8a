//! End-to-end integration tests for the SkillLoop turn loop.
//!
//! These tests drive the real tool registry (shell, files, skills, memory)
//! through the turn controller with a scripted model, checking the skill
//! pool and the conversation log after each turn.

use std::path::Path;
use std::sync::{Arc, Mutex};

use skillloop_agent::{PromptAssembler, TurnController};
use skillloop_config::AppConfig;
use skillloop_core::error::ProviderError;
use skillloop_core::event::{DomainEvent, EventBus};
use skillloop_core::message::{AssistantMessage, ConversationEntry, ToolCallRequest};
use skillloop_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use skillloop_core::session::SessionState;
use skillloop_tools::{FsSkillStore, default_registry};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and keeps
/// every request it was sent.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, n: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[n].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let call = requests.len();
        if call >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                call,
                responses.len()
            );
        }
        requests.push(request);
        Ok(responses[call].clone())
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: AssistantMessage::text(text),
        usage: usage(),
        model: "mock".into(),
    }
}

fn tool_response(tool_calls: Vec<ToolCallRequest>) -> ProviderResponse {
    ProviderResponse {
        message: AssistantMessage::with_tool_calls("", tool_calls),
        usage: usage(),
        model: "mock".into(),
    }
}

fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest::new(id, name, args.as_object().cloned().unwrap_or_default())
}

fn skill_call(id: &str, skill: &str, action: &str) -> ToolCallRequest {
    make_tool_call(
        id,
        "manage_skill",
        serde_json::json!({"skill_name": skill, "action": action}),
    )
}

// ── Fixture ──────────────────────────────────────────────────────────────

struct Fixture {
    _dir: tempfile::TempDir,
    provider: Arc<ScriptedProvider>,
    controller: TurnController,
}

fn install_skill(root: &Path, name: &str, body: &str) {
    std::fs::create_dir_all(root.join(name)).unwrap();
    std::fs::write(root.join(name).join("SKILL.md"), body).unwrap();
}

/// Real tools over a temp directory: skills in `<tmp>/skills`, memory in
/// `<tmp>/MEMORY.md`, relative paths resolved against `<tmp>/work`.
async fn fixture(skills: &[(&str, &str)], responses: Vec<ProviderResponse>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let skills_root = dir.path().join("skills");
    for (name, body) in skills {
        install_skill(&skills_root, name, body);
    }
    let work = dir.path().join("work");
    std::fs::create_dir_all(&work).unwrap();

    let mut config = AppConfig::default();
    config.memory.file = Some(dir.path().join("MEMORY.md").display().to_string());

    let store = Arc::new(FsSkillStore::new(&skills_root));
    let tools = Arc::new(default_registry(&config, store, &work).await);
    let provider = Arc::new(ScriptedProvider::new(responses));
    let controller = TurnController::new(
        provider.clone(),
        "mock",
        tools,
        PromptAssembler::with_instructions("BASE"),
    )
    .with_max_iterations(10);

    Fixture {
        _dir: dir,
        provider,
        controller,
    }
}

fn snapshot(state: &SessionState) -> Vec<ConversationEntry> {
    state.log.iter().cloned().collect()
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_activation_populates_pool_and_next_prompt() {
    let protocol = "Use requests+BeautifulSoup...";
    let f = fixture(
        &[("web_scraper", protocol)],
        vec![
            tool_response(vec![skill_call("call_1", "web_scraper", "activate")]),
            text_response("Skill ready."),
        ],
    )
    .await;

    let mut state = SessionState::new();
    let answer = f.controller.submit(&mut state, "scrape a page").await.unwrap();

    assert_eq!(answer, "Skill ready.");
    assert_eq!(state.skills.names(), vec!["web_scraper"]);
    assert_eq!(state.skills.get("web_scraper"), Some(protocol));

    // The second model call already carries the protocol
    let second = f.provider.request(1);
    assert!(second.system_prompt.contains("[Skill: web_scraper]"));
    assert!(second.system_prompt.contains(protocol));
    assert!(!f.provider.request(0).system_prompt.contains("Active Skills"));
}

#[tokio::test]
async fn e2e_mixed_batch_only_skill_result_mutates_pool() {
    let f = fixture(
        &[("x", "proto-X")],
        vec![
            tool_response(vec![
                skill_call("call_skill", "x", "activate"),
                make_tool_call("call_shell", "run_shell", serde_json::json!({"command": "echo file1.txt"})),
            ]),
            text_response("done"),
        ],
    )
    .await;

    let mut state = SessionState::new();
    f.controller.submit(&mut state, "go").await.unwrap();

    assert_eq!(state.skills.names(), vec!["x"]);
    assert_eq!(state.skills.get("x"), Some("proto-X"));

    let shell = state
        .log
        .iter()
        .filter_map(ConversationEntry::as_tool_result)
        .find(|r| r.correlation_id == "call_shell")
        .unwrap();
    if cfg!(unix) {
        assert_eq!(shell.content, "file1.txt");
    }
}

#[tokio::test]
async fn e2e_deactivation_empties_pool() {
    let f = fixture(
        &[("x", "proto-X")],
        vec![
            tool_response(vec![skill_call("call_1", "x", "activate")]),
            text_response("on"),
            tool_response(vec![skill_call("call_2", "x", "deactivate")]),
            text_response("off"),
        ],
    )
    .await;

    let mut state = SessionState::new();
    f.controller.submit(&mut state, "turn it on").await.unwrap();
    assert_eq!(state.skills.get("x"), Some("proto-X"));

    f.controller.submit(&mut state, "turn it off").await.unwrap();
    assert!(state.skills.is_empty());
    assert!(!f.provider.request(3).system_prompt.contains("proto-X"));
}

#[tokio::test]
async fn e2e_plain_answer_runs_no_tools() {
    let f = fixture(&[], vec![text_response("Hello!")]).await;
    let bus = f.controller.event_bus();
    let mut rx = bus.subscribe();

    let mut state = SessionState::new();
    let answer = f.controller.submit(&mut state, "hi").await.unwrap();

    assert_eq!(answer, "Hello!");
    assert_eq!(f.provider.calls(), 1);
    assert_eq!(state.log.len(), 2);

    let mut saw_tool = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event.as_ref(), DomainEvent::ToolExecuted { .. }) {
            saw_tool = true;
        }
    }
    assert!(!saw_tool);
}

#[tokio::test]
async fn e2e_unknown_skill_leaves_pool_untouched() {
    let f = fixture(
        &[],
        vec![
            tool_response(vec![skill_call("call_1", "ghost", "activate")]),
            text_response("no such skill"),
        ],
    )
    .await;

    let mut state = SessionState::new();
    f.controller.submit(&mut state, "use ghost").await.unwrap();

    assert!(state.skills.is_empty());
    let result = state
        .log
        .iter()
        .filter_map(ConversationEntry::as_tool_result)
        .next()
        .unwrap();
    assert_eq!(result.content, "Error: Skill 'ghost' is not registered locally.");
}

// ── Properties ───────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_log_is_append_only_across_turns() {
    let f = fixture(
        &[("x", "proto-X")],
        vec![
            tool_response(vec![skill_call("call_1", "x", "activate")]),
            text_response("one"),
            tool_response(vec![make_tool_call(
                "call_2",
                "write_file",
                serde_json::json!({"file_path": "notes/a.txt", "content": "hello"}),
            )]),
            text_response("two"),
            text_response("three"),
        ],
    )
    .await;

    let mut state = SessionState::new();
    let mut previous = snapshot(&state);
    for msg in ["first", "second", "third"] {
        f.controller.submit(&mut state, msg).await.unwrap();
        let current = snapshot(&state);
        assert!(current.len() > previous.len());
        assert_eq!(&current[..previous.len()], previous.as_slice());
        previous = current;
    }
}

#[tokio::test]
async fn e2e_reactivation_keeps_single_entry() {
    let f = fixture(
        &[("x", "proto-X")],
        vec![
            tool_response(vec![skill_call("call_1", "x", "activate")]),
            text_response("on"),
            tool_response(vec![skill_call("call_2", "x", "activate")]),
            text_response("still on"),
        ],
    )
    .await;

    let mut state = SessionState::new();
    f.controller.submit(&mut state, "a").await.unwrap();
    f.controller.submit(&mut state, "b").await.unwrap();

    assert_eq!(state.skills.len(), 1);
    assert_eq!(state.skills.get("x"), Some("proto-X"));
    let prompt = f.provider.request(3).system_prompt;
    assert_eq!(prompt.matches("[Skill: x]").count(), 1);
}

#[tokio::test]
async fn e2e_non_skill_batch_leaves_pool_identical() {
    let f = fixture(
        &[("x", "proto-X")],
        vec![
            tool_response(vec![skill_call("call_1", "x", "activate")]),
            text_response("on"),
            tool_response(vec![
                make_tool_call("call_2", "write_file", serde_json::json!({"file_path": "out/a.txt", "content": "SYSTEM_INJECTION: not a skill"})),
                make_tool_call("call_3", "read_file", serde_json::json!({"file_path": "out/a.txt"})),
            ]),
            text_response("files handled"),
        ],
    )
    .await;

    let mut state = SessionState::new();
    f.controller.submit(&mut state, "a").await.unwrap();
    let before = state.skills.clone();

    f.controller.submit(&mut state, "b").await.unwrap();
    assert_eq!(state.skills, before);
}

#[tokio::test]
async fn e2e_marker_text_from_other_tools_is_ignored() {
    // A shell command that prints the activation marker must not activate anything
    let f = fixture(
        &[],
        vec![
            tool_response(vec![make_tool_call(
                "call_1",
                "run_shell",
                serde_json::json!({"command": "echo 'SYSTEM_INJECTION: sneaky'"}),
            )]),
            text_response("printed"),
        ],
    )
    .await;

    let mut state = SessionState::new();
    f.controller.submit(&mut state, "print it").await.unwrap();
    assert!(state.skills.is_empty());
}

#[tokio::test]
async fn e2e_deactivating_absent_skill_is_noop() {
    let f = fixture(
        &[("x", "proto-X"), ("y", "proto-Y")],
        vec![
            tool_response(vec![skill_call("call_1", "x", "activate")]),
            text_response("on"),
            tool_response(vec![skill_call("call_2", "y", "deactivate")]),
            text_response("nothing to do"),
        ],
    )
    .await;

    let mut state = SessionState::new();
    f.controller.submit(&mut state, "a").await.unwrap();
    let before = state.skills.clone();

    let answer = f.controller.submit(&mut state, "b").await.unwrap();
    assert_eq!(answer, "nothing to do");
    assert_eq!(state.skills, before);
}

// ── Tools through the loop ───────────────────────────────────────────────

#[tokio::test]
async fn e2e_memory_tool_persists_facts() {
    let dir = tempfile::tempdir().unwrap();
    let memory = dir.path().join("MEMORY.md");
    let mut config = AppConfig::default();
    config.memory.file = Some(memory.display().to_string());

    let store = Arc::new(FsSkillStore::new(dir.path().join("skills")));
    let tools = Arc::new(default_registry(&config, store, dir.path()).await);
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![make_tool_call(
            "call_1",
            "manage_memory",
            serde_json::json!({"action": "add", "content": "User prefers tabs"}),
        )]),
        text_response("Noted."),
    ]));
    let controller = TurnController::new(
        provider,
        "mock",
        tools,
        PromptAssembler::with_instructions("BASE"),
    );

    let mut state = SessionState::new();
    controller.submit(&mut state, "remember tabs").await.unwrap();

    let text = std::fs::read_to_string(&memory).unwrap();
    assert!(text.starts_with("# Long-term Memory"));
    assert!(text.contains("User prefers tabs"));
}

#[tokio::test]
async fn e2e_events_report_skill_changes() {
    let f = fixture(
        &[("x", "proto-X")],
        vec![
            tool_response(vec![skill_call("call_1", "x", "activate")]),
            text_response("on"),
        ],
    )
    .await;
    let bus: Arc<EventBus> = f.controller.event_bus();
    let mut rx = bus.subscribe();

    let mut state = SessionState::new();
    f.controller.submit(&mut state, "a").await.unwrap();

    let mut activated = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let DomainEvent::SkillActivated { name, .. } = event.as_ref() {
            activated.push(name.clone());
        }
    }
    assert_eq!(activated, vec!["x".to_string()]);
}

#[tokio::test]
async fn e2e_config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.skills.management_tool, "manage_skill");
    assert_eq!(config.agent.max_iterations, 25);
    assert!(config.memory.archive_sessions);
}
