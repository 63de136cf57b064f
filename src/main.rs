use anyhow::Result;
use clap::Parser;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod app;
mod config;
mod error;
mod events;
mod mappings;
mod services;
mod utils;

use app::App;
use config::Config;
use services::binding_store::StoreDocument;
use services::window_system::WindowClassifier;
use services::{
    create_hotkey_backend, create_window_system, BindingStore, ChordTable, HotkeyManager, InputListener,
    MemoryBindingStore, ModifierState, TomlBindingStore, WindowPoller, WindowRegistry,
};
use utils::DeviceFinder;

#[derive(Parser, Debug)]
#[command(name = "mbx-hotkeys")]
#[command(about = "Глобальные горячие клавиши для переключения между окнами клиента")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "mbx-hotkeys.toml")]
    config: String,

    /// Режим сухого запуска (без устройств и реальных действий с окнами)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    /// Профиль привязок (по умолчанию из конфигурации)
    #[arg(short, long)]
    profile: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск mbx-hotkeys v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if let Some(profile) = args.profile {
        config.hotkeys.profile = profile;
    }

    if args.dry_run {
        warn!("Режим сухого запуска - устройства не читаются, окна не трогаются");
    } else {
        utils::permissions::check_permissions()?;
    }

    // Хранилище привязок: в dry-run изменения остаются в памяти
    let file_store = TomlBindingStore::new(&config.hotkeys.store_path);
    let store: Box<dyn BindingStore> = if args.dry_run {
        let document = file_store.read_document().unwrap_or_else(|e| {
            warn!("Не удалось прочитать {:?}: {}", file_store.path(), e);
            StoreDocument::default()
        });
        Box::new(MemoryBindingStore::from_document(document))
    } else {
        Box::new(file_store)
    };

    let chords = ChordTable::new();
    let mut manager = HotkeyManager::new(create_hotkey_backend(&chords, args.dry_run), config.policy());
    manager.load(store.as_ref(), &config.hotkeys.profile)?;

    let (tx, mut rx) = mpsc::unbounded_channel();

    if !args.dry_run {
        let modifiers = Arc::new(RwLock::new(ModifierState::new()));

        let keyboard = DeviceFinder::find_keyboard_device(&config.input.keyboard_device)?;
        InputListener::spawn(&keyboard, chords.clone(), modifiers.clone(), tx.clone())?;

        if config.input.enable_mouse {
            let mouse = DeviceFinder::find_mouse_device(&config.input.mouse_device)
                .and_then(|path| InputListener::spawn(&path, chords.clone(), modifiers.clone(), tx.clone()));
            if let Err(e) = mouse {
                warn!("Кнопки мыши недоступны: {}", e);
            }
        }
    }

    let (source, activator) = create_window_system(args.dry_run);
    let poller = WindowPoller::new(source, config.window.polling_interval_ms, tx);
    let poller_handle = tokio::spawn(async move {
        if let Err(e) = poller.run().await {
            error!("Ошибка в WindowPoller: {}", e);
        }
    });

    let windows = WindowRegistry::new(WindowClassifier::from_config(&config.window));
    let mut app = App::new(manager, windows, activator, store);

    info!("Все сервисы запущены");

    loop {
        tokio::select! {
            input = rx.recv() => {
                let Some(input) = input else {
                    warn!("Все источники событий остановлены");
                    break;
                };
                if let Err(e) = app.handle_input(input).await {
                    error!("Ошибка обработки события: {}", e);
                }
            }
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                    Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
                }
                break;
            }
        }
    }

    info!("Завершение работы...");

    poller_handle.abort();
    // Реестр снимает все горячие клавиши при уничтожении
    drop(app);

    info!("mbx-hotkeys завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        "compact" => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    Ok(())
}
