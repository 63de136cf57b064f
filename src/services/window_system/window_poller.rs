use crate::error::Result;
use crate::events::{RawInput, WindowSnapshot};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use super::r#trait::WindowSource;

// После стольких ошибок подряд опрос делает паузу
const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Периодический опрос источника окон. Отправляет новый снимок в главный цикл
/// только при изменении, смену активного окна сообщает отдельным событием.
pub struct WindowPoller {
    source: Box<dyn WindowSource>,
    period: Duration,
    sender: UnboundedSender<RawInput>,
    last: Option<WindowSnapshot>,
    failures: u32,
}

impl WindowPoller {
    pub fn new(source: Box<dyn WindowSource>, polling_interval_ms: u64, sender: UnboundedSender<RawInput>) -> Self {
        Self {
            source,
            period: Duration::from_millis(polling_interval_ms.max(1)),
            sender,
            last: None,
            failures: 0,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!(
            "Опрос окон запущен (источник: {}, период: {:?})",
            self.source.name(),
            self.period
        );

        let mut ticker = interval(self.period);

        loop {
            ticker.tick().await;

            match self.poll_once().await {
                Ok(true) => {}
                Ok(false) => {
                    info!("Главный цикл завершён, опрос окон остановлен");
                    return Ok(());
                }
                Err(e) => {
                    self.failures += 1;
                    if self.failures == 1 {
                        warn!("Не удалось получить список окон: {}", e);
                    } else {
                        debug!("Не удалось получить список окон ({} подряд): {}", self.failures, e);
                    }

                    if self.failures >= MAX_CONSECUTIVE_FAILURES {
                        error!("Источник окон {} не отвечает. Пауза 10 секунд", self.source.name());
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        self.failures = 0;
                    }
                }
            }
        }
    }

    /// Один шаг опроса. `Ok(false)` означает, что получатель закрыт.
    pub async fn poll_once(&mut self) -> Result<bool> {
        let snapshot = self.source.snapshot().await?;
        self.failures = 0;

        if self.last.as_ref() == Some(&snapshot) {
            return Ok(true);
        }

        let previous_foreground = self.last.as_ref().and_then(|s| s.foreground);
        let foreground = snapshot.foreground;
        self.last = Some(snapshot.clone());

        if self.sender.send(RawInput::Windows(snapshot)).is_err() {
            return Ok(false);
        }

        if let Some(handle) = foreground {
            if previous_foreground != Some(handle) {
                debug!("Смена активного окна: {:?} -> {}", previous_foreground, handle);
                if self.sender.send(RawInput::WindowActivated(handle)).is_err() {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}
