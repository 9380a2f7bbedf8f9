use tokio::sync::watch;

/// Releases every waiting agent at once. Fired at most once.
pub struct StartGate {
    sender: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct StartSignal {
    receiver: watch::Receiver<bool>,
}

impl StartGate {
    pub fn new() -> (Self, StartSignal) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, StartSignal { receiver })
    }

    pub fn release(self) {
        // send_replace never fails, even with no receivers left
        self.sender.send_replace(true);
    }
}

impl StartSignal {
    /// Resolves once the gate is released (or dropped unreleased).
    pub async fn wait(mut self) {
        while !*self.receiver.borrow_and_update() {
            if self.receiver.changed().await.is_err() {
                return;
            }
        }
    }
}
