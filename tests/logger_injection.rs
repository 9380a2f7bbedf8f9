use gridlock_sim::adapters::{init_buffered_logger, init_noop_logger, MemorySink, MultiLogger};
use gridlock_sim::application::Simulation;
use gridlock_sim::config::Config;
use gridlock_sim::domains::logger::DomainLogger;
use std::sync::{Arc, Mutex};

struct BridgeCapture {
    messages: Arc<Mutex<Vec<String>>>,
}

impl BridgeCapture {
    fn new() -> Self { Self { messages: Arc::new(Mutex::new(Vec::new())) } }
}

impl DomainLogger for BridgeCapture {
    fn info(&self, msg: &str) { self.messages.lock().unwrap().push(format!("INFO:{}", msg)); }
    fn warn(&self, msg: &str) { self.messages.lock().unwrap().push(format!("WARN:{}", msg)); }
    fn error(&self, msg: &str) { self.messages.lock().unwrap().push(format!("ERR:{}", msg)); }
}

#[tokio::test]
async fn test_buffered_and_noop_logger() {
    let capture = Arc::new(BridgeCapture::new());
    let bridge = capture.clone() as Arc<dyn DomainLogger>;

    let (buffered, forwarder) = init_buffered_logger(bridge.clone(), 8);

    buffered.info("one");
    buffered.warn("two");
    buffered.error("three");
    assert_eq!(buffered.dropped(), 0);

    // dropping the last handle lets the forwarder drain and finish
    drop(buffered);
    forwarder.await.unwrap();

    let msgs = capture.messages.lock().unwrap();
    assert_eq!(
        *msgs,
        vec!["INFO:one".to_string(), "WARN:two".to_string(), "ERR:three".to_string()]
    );

    let noop = init_noop_logger();
    noop.info("ignored");
    noop.error("ignored-err");
}

#[tokio::test]
async fn test_buffered_logger_counts_overflow() {
    let capture = Arc::new(BridgeCapture::new());
    let (buffered, _forwarder) = init_buffered_logger(capture.clone(), 1);

    // no await in between, so the forwarder cannot drain the buffer
    for i in 0..5 {
        buffered.info(&format!("burst {}", i));
    }
    assert_eq!(buffered.dropped(), 4);
}

#[test]
fn test_multi_logger_fans_out_in_order() {
    let first = Arc::new(BridgeCapture::new());
    let second = Arc::new(BridgeCapture::new());
    let multi = MultiLogger::new(vec![
        first.clone() as Arc<dyn DomainLogger>,
        second.clone() as Arc<dyn DomainLogger>,
    ]);

    multi.info("hello");
    multi.warn("careful");

    for capture in [&first, &second] {
        let msgs = capture.messages.lock().unwrap();
        assert_eq!(*msgs, vec!["INFO:hello".to_string(), "WARN:careful".to_string()]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_simulation_reports_through_injected_logger() {
    let capture = Arc::new(BridgeCapture::new());

    let mut config = Config::default();
    config.seed = Some(17);
    config.board.width = 4;
    config.board.height = 4;
    config.agents.travelers = 2;
    config.agents.wild_tenants = 1;
    config.agents.traps = 1;
    config.agents.min_steps = 1;
    config.agents.max_steps = 3;
    config.timing.min_delay_ms = 1;
    config.timing.max_delay_ms = 10;
    config.timing.wild_tenant_lifetime_ms = 20;

    let simulation = Simulation::new(config, capture.clone());
    simulation.run(MemorySink::new()).await.unwrap();

    let msgs = capture.messages.lock().unwrap();
    assert!(msgs.iter().any(|m| m.starts_with("INFO:run ") && m.contains("seed 17")));
    assert!(msgs.iter().any(|m| m.contains("finished")));
    assert!(!msgs.iter().any(|m| m.starts_with("ERR:")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_agent_events_reach_the_injected_logger() {
    let capture = Arc::new(BridgeCapture::new());

    let mut config = Config::default();
    config.seed = Some(29);
    config.board.width = 5;
    config.board.height = 5;
    config.agents.travelers = 3;
    config.agents.wild_tenants = 0;
    config.agents.traps = 0;
    config.agents.min_steps = 2;
    config.agents.max_steps = 4;
    config.timing.min_delay_ms = 1;
    config.timing.max_delay_ms = 5;

    let simulation = Simulation::new(config, capture.clone());
    simulation.run(MemorySink::new()).await.unwrap();

    // every traveler reports where it halted, before the run is declared finished
    let msgs = capture.messages.lock().unwrap();
    let finished = msgs.iter().position(|m| m.contains("finished")).unwrap();
    for id in 0..3 {
        let prefix = format!("INFO:traveler {} ", id);
        let reported = msgs.iter().position(|m| m.starts_with(&prefix));
        assert!(reported.is_some(), "no event from traveler {}", id);
        assert!(reported.unwrap() < finished);
    }
    assert!(!msgs.iter().any(|m| m.starts_with("WARN:") && m.contains("dropped")));
}
