use super::*;
use crate::cli::chats::resolve_chat_id;
use crate::cli::model_list::describe_model;
use crate::cli::send::resolve_model;
use crate::cli::servers::resolve_server_id;
use crate::core::chat::ChatThread;
use crate::core::message::Message;
use crate::core::settings::{NewServer, DEFAULT_SERVER_ID};
use crate::core::store::SessionState;
use crate::utils::test_utils::{create_test_model, create_test_store, FakeRegistry};
use tempfile::TempDir;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }

    /// Run one command against `store` and return what it printed.
    pub(super) async fn run_command(
        argv: &[&str],
        store: &SessionStore,
        config: &Config,
    ) -> Result<String, String> {
        let args = parse_args(argv);
        let mut out = Vec::new();
        dispatch(args.command, store, config, &mut out)
            .await
            .map_err(|err| err.to_string())?;
        Ok(String::from_utf8(out).expect("handlers write UTF-8"))
    }
}

use test_helpers::{parse_args, run_command};

#[test]
fn test_send_collects_trailing_words() {
    let argv = ["ollama-chat", "send", "-m", "llama3", "how", "do", "-I", "bake?"];
    match parse_args(&argv).command {
        Commands::Send {
            model,
            message,
            chat,
            attach,
        } => {
            assert_eq!(model.as_deref(), Some("llama3"));
            assert_eq!(message.join(" "), "how do -I bake?");
            assert!(chat.is_none());
            assert!(attach.is_none());
        }
        _ => panic!("expected send subcommand for argv={argv:?}"),
    }
}

#[test]
fn test_send_requires_a_message() {
    assert!(Args::try_parse_from(["ollama-chat", "send"]).is_err());
}

#[test]
fn test_server_add_defaults_port() {
    match parse_args(&["ollama-chat", "server", "add", "Lab", "http://10.0.0.5"]).command {
        Commands::Server {
            command: ServerCommands::Add { name, url, port },
        } => {
            assert_eq!(name, "Lab");
            assert_eq!(url, "http://10.0.0.5");
            assert_eq!(port, 11434);
        }
        _ => panic!("expected server add subcommand"),
    }
}

#[test]
fn test_refresh_all_conflicts_with_id() {
    assert!(Args::try_parse_from(["ollama-chat", "server", "refresh", "default", "--all"]).is_err());
    assert!(Args::try_parse_from(["ollama-chat", "server", "refresh", "--all"]).is_ok());
}

#[test]
fn test_settings_values_parse_case_insensitively() {
    match parse_args(&["ollama-chat", "settings", "theme", "DARK"]).command {
        Commands::Settings {
            command: SettingsCommands::Theme { value },
        } => assert_eq!(value, Theme::Dark),
        _ => panic!("expected settings theme subcommand"),
    }
    assert!(Args::try_parse_from(["ollama-chat", "settings", "font-size", "huge"]).is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let args = parse_args(&[
        "ollama-chat",
        "chat",
        "list",
        "--state",
        "/tmp/state.json",
        "--log",
        "/tmp/chat.log",
    ]);
    assert_eq!(args.state, Some(PathBuf::from("/tmp/state.json")));
    assert_eq!(args.log, Some(PathBuf::from("/tmp/chat.log")));
}

#[test]
fn test_state_path_precedence() {
    let config = Config {
        state_file: Some(PathBuf::from("/from/config.json")),
        ..Default::default()
    };
    let flag = PathBuf::from("/from/flag.json");

    assert_eq!(
        resolve_state_path(&config, Some(&flag)).unwrap(),
        PathBuf::from("/from/flag.json")
    );
    assert_eq!(
        resolve_state_path(&config, None).unwrap(),
        PathBuf::from("/from/config.json")
    );
}

#[test]
fn test_chat_ids_resolve_by_unique_prefix() {
    let state = SessionState {
        chats: vec![
            ChatThread::with_id("abc-111"),
            ChatThread::with_id("abc-222"),
            ChatThread::with_id("def-333"),
        ],
        ..Default::default()
    };

    assert_eq!(resolve_chat_id(&state, "abc-111").unwrap(), "abc-111");
    assert_eq!(resolve_chat_id(&state, "def").unwrap(), "def-333");
    assert!(resolve_chat_id(&state, "abc").unwrap_err().contains("ambiguous"));
    assert!(resolve_chat_id(&state, "zzz").unwrap_err().contains("No chat"));
}

#[test]
fn test_servers_resolve_by_id_or_name() {
    let state = SessionState::default();
    assert_eq!(resolve_server_id(&state, DEFAULT_SERVER_ID).unwrap(), "default");
    assert_eq!(resolve_server_id(&state, "local ollama").unwrap(), "default");
    assert!(resolve_server_id(&state, "remote").is_err());
}

#[tokio::test]
async fn test_model_resolution_order() {
    let registry = Arc::new(FakeRegistry::new());
    registry.set_models("http://localhost:11434", vec![create_test_model("mistral")]);
    let store = create_test_store(registry);
    let mut config = Config::default();

    assert_eq!(resolve_model(&store, &config, None), None);

    store.refresh_server_models(DEFAULT_SERVER_ID).await.unwrap();
    assert_eq!(
        resolve_model(&store, &config, None).as_deref(),
        Some("mistral")
    );

    config.default_model = Some("llama3".to_string());
    assert_eq!(resolve_model(&store, &config, None).as_deref(), Some("llama3"));
    assert_eq!(
        resolve_model(&store, &config, Some("qwen2".to_string())).as_deref(),
        Some("qwen2")
    );
}

#[test]
fn test_describe_model_includes_known_details() {
    let line = describe_model(&create_test_model("llama3:8b"));
    assert_eq!(line, "llama3:8b (8.0B, Q4_0, 4.7 GB, modified 2024-05-01)");

    let bare = crate::api::ModelDescriptor {
        name: "tiny".to_string(),
        ..Default::default()
    };
    assert_eq!(describe_model(&bare), "tiny");
}

#[tokio::test]
async fn test_chat_lifecycle_commands() {
    let registry = Arc::new(FakeRegistry::new());
    let store = create_test_store(registry);
    let config = Config::default();

    let output = run_command(&["ollama-chat", "chat", "new"], &store, &config)
        .await
        .unwrap();
    assert!(output.starts_with("✅ Started chat "));
    let id = store.read(|state| state.current_chat_id.clone()).unwrap();

    run_command(
        &["ollama-chat", "chat", "rename", &id[..8], "Bread", "Baking"],
        &store,
        &config,
    )
    .await
    .unwrap();
    let listing = run_command(&["ollama-chat", "chat", "list", "--search", "bread"], &store, &config)
        .await
        .unwrap();
    assert!(listing.contains(&format!("* {id}  Bread Baking (0 messages)")));

    let err = run_command(&["ollama-chat", "chat", "rename", &id, "   "], &store, &config)
        .await
        .unwrap_err();
    assert_eq!(err, "Title cannot be empty");

    let none = run_command(&["ollama-chat", "chat", "list", "--search", "pasta"], &store, &config)
        .await
        .unwrap();
    assert_eq!(none, "No chats match 'pasta'.\n");

    run_command(&["ollama-chat", "chat", "delete", &id], &store, &config)
        .await
        .unwrap();
    assert!(store.read(|state| state.chats.is_empty() && state.current_chat_id.is_none()));
}

#[tokio::test]
async fn test_send_creates_thread_and_prints_reply() {
    let registry = Arc::new(FakeRegistry::new());
    registry.push_reply("Sourdough Starter Tips");
    registry.push_reply("Feed it daily.");
    let store = create_test_store(registry.clone());
    let config = Config {
        default_model: Some("llama3".to_string()),
        ..Default::default()
    };

    let output = run_command(
        &["ollama-chat", "send", "--attach", "/photos/jar.png", "Is", "this", "ready?"],
        &store,
        &config,
    )
    .await
    .unwrap();

    assert_eq!(output, "💬 Sourdough Starter Tips\n\nFeed it daily.\n");
    let chat = store.read(|state| state.current_chat().cloned()).unwrap();
    assert_eq!(chat.title, "Sourdough Starter Tips");
    assert_eq!(
        chat.messages[0],
        Message::user("Is this ready? [Attached image: jar.png]")
    );
    assert_eq!(registry.completions()[1].1, "llama3");
}

#[tokio::test]
async fn test_send_without_model_fails_before_creating_thread() {
    let registry = Arc::new(FakeRegistry::new());
    let store = create_test_store(registry.clone());

    let err = run_command(&["ollama-chat", "send", "hello"], &store, &Config::default())
        .await
        .unwrap_err();

    assert!(err.starts_with("No model selected"));
    assert!(store.read(|state| state.chats.is_empty()));
    assert!(registry.completions().is_empty());
}

#[tokio::test]
async fn test_blank_send_leaves_no_thread_behind() {
    let registry = Arc::new(FakeRegistry::new());
    let store = create_test_store(registry.clone());

    let err = run_command(
        &["ollama-chat", "send", "-m", "llama3", "   "],
        &store,
        &Config::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err, "Message is empty");
    assert_eq!(store.read(|state| state.chats.len()), 0);
    assert!(store.read(|state| state.current_chat_id.is_none()));
    assert!(registry.completions().is_empty());
}

#[tokio::test]
async fn test_send_reports_missing_reply() {
    let registry = Arc::new(FakeRegistry::new());
    let store = create_test_store(registry.clone());
    let chat_id = store.create_chat().unwrap();
    store.append_message(&chat_id, Message::user("Earlier")).unwrap();

    let output = run_command(
        &["ollama-chat", "send", "-m", "llama3", "again"],
        &store,
        &Config::default(),
    )
    .await
    .unwrap();

    assert!(output.starts_with("⚠️  No reply received."));
    let count = store.read(|state| state.chat(&chat_id).unwrap().messages.len());
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_server_commands_manage_registry() {
    let registry = Arc::new(FakeRegistry::new());
    let store = create_test_store(registry.clone());
    let config = Config::default();

    run_command(
        &["ollama-chat", "server", "add", "Lab", "http://10.0.0.5", "--port", "8080"],
        &store,
        &config,
    )
    .await
    .unwrap();
    let err = run_command(
        &["ollama-chat", "server", "add", "Again", "http://10.0.0.5", "--port", "8080"],
        &store,
        &config,
    )
    .await
    .unwrap_err();
    assert!(err.contains("already exists"));

    run_command(&["ollama-chat", "server", "use", "lab"], &store, &config)
        .await
        .unwrap();
    let active = store.read(|state| state.active_server().map(|server| server.name.clone()));
    assert_eq!(active.as_deref(), Some("Lab"));

    let output = run_command(&["ollama-chat", "server", "remove", "Lab"], &store, &config)
        .await
        .unwrap();
    assert!(output.contains("Active server: Local Ollama"));

    let err = run_command(&["ollama-chat", "server", "remove", "default"], &store, &config)
        .await
        .unwrap_err();
    assert_eq!(err, "Cannot remove the only configured server.");
}

#[tokio::test]
async fn test_refresh_all_reports_each_server() {
    let registry = Arc::new(FakeRegistry::new());
    registry.set_models(
        "http://localhost:11434",
        vec![create_test_model("llama3"), create_test_model("mistral")],
    );
    registry.fail_models("http://10.0.0.5:11434", 500);
    let store = create_test_store(registry.clone());
    let lab = store
        .add_server(NewServer {
            name: "Lab".to_string(),
            url: "http://10.0.0.5".to_string(),
            port: 11434,
        })
        .unwrap();

    let output = run_command(
        &["ollama-chat", "server", "refresh", "--all"],
        &store,
        &Config::default(),
    )
    .await
    .unwrap();

    assert!(output.contains("✅ default: 2 model(s)"));
    assert!(output.contains(&format!("❌ {lab}: could not reach server")));
    assert_eq!(registry.listed().len(), 2);
}

#[tokio::test]
async fn test_model_delete_refreshes_cache() {
    let registry = Arc::new(FakeRegistry::new());
    registry.set_models("http://localhost:11434", vec![create_test_model("mistral")]);
    let store = create_test_store(registry.clone());

    let output = run_command(
        &["ollama-chat", "models", "delete", "llama3"],
        &store,
        &Config::default(),
    )
    .await
    .unwrap();

    assert!(output.starts_with("✅ Deleted model llama3\n"));
    assert_eq!(
        registry.deleted(),
        vec![("http://localhost:11434".to_string(), "llama3".to_string())]
    );
    let listing = run_command(&["ollama-chat", "models", "list"], &store, &Config::default())
        .await
        .unwrap();
    assert!(listing.contains("mistral"));
}

#[tokio::test]
async fn test_settings_commands_patch_nested_objects() {
    let registry = Arc::new(FakeRegistry::new());
    let store = create_test_store(registry);
    let config = Config::default();

    run_command(&["ollama-chat", "settings", "font-size", "lg"], &store, &config)
        .await
        .unwrap();
    run_command(&["ollama-chat", "settings", "theme", "dark"], &store, &config)
        .await
        .unwrap();
    run_command(
        &["ollama-chat", "settings", "github", "--username", "octo"],
        &store,
        &config,
    )
    .await
    .unwrap();

    let settings = store.read(|state| state.settings.clone());
    assert_eq!(settings.appearance.theme, Theme::Dark);
    assert_eq!(settings.appearance.font_size, FontSize::Lg);
    assert_eq!(settings.github.username, "octo");
    assert!(settings.github.token.is_empty());

    let shown = run_command(&["ollama-chat", "settings", "show"], &store, &config)
        .await
        .unwrap();
    assert!(shown.contains("theme: dark"));
    assert!(shown.contains("github: octo\n"));
}

#[tokio::test]
async fn test_exports_write_json_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let registry = Arc::new(FakeRegistry::new());
    let store = create_test_store(registry);
    let config = Config::default();
    let chat_id = store.create_chat().unwrap();
    store.append_message(&chat_id, Message::user("Hi")).unwrap();

    let single = temp_dir.path().join("one.json");
    let single_arg = single.to_string_lossy().into_owned();
    run_command(
        &["ollama-chat", "chat", "export", "-o", &single_arg],
        &store,
        &config,
    )
    .await
    .unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&single).unwrap()).unwrap();
    assert_eq!(json["title"], "New Chat");
    assert_eq!(json["messages"][0]["content"], "Hi");

    let err = run_command(
        &["ollama-chat", "chat", "export", "-o", &single_arg],
        &store,
        &config,
    )
    .await
    .unwrap_err();
    assert!(err.contains("already exists"));

    let all = temp_dir.path().join("all.json");
    let all_arg = all.to_string_lossy().into_owned();
    let output = run_command(&["ollama-chat", "export-all", "-o", &all_arg], &store, &config)
        .await
        .unwrap();
    assert!(output.starts_with("✅ Exported 1 chat(s)"));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&all).unwrap()).unwrap();
    assert_eq!(json["chats"][0]["id"], chat_id.as_str());
}

#[tokio::test]
async fn test_config_show_writes_to_sink() {
    let store = create_test_store(Arc::new(FakeRegistry::new()));
    let config = Config {
        default_model: Some("llama3:8b".to_string()),
        request_timeout_secs: Some(30),
        ..Default::default()
    };

    let output = run_command(&["ollama-chat", "config", "show"], &store, &config)
        .await
        .unwrap();

    assert_eq!(
        output,
        "Current configuration:\n  state-file: (default)\n  default-model: llama3:8b\n  \
request-timeout-secs: 30\n  log-level: (unset)\n"
    );
}
