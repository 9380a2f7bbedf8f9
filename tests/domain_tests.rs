use gridlock_sim::common::*;
use gridlock_sim::domains::agents::Roster;
use gridlock_sim::domains::grid::*;
use std::sync::Arc;
use std::time::Duration;

fn settings(lock_timeout: Duration) -> CellSettings {
    CellSettings {
        lock_timeout,
        trigger_pause: Duration::from_millis(1),
        inbox_capacity: 16,
    }
}

fn grid(width: usize, height: usize, roster: &Arc<Roster>) -> Grid {
    Grid::spawn(
        BoardSize::new(width, height),
        roster.clone(),
        Clock::start(),
        settings(Duration::from_millis(200)),
        42,
    )
}

async fn place(grid: &Grid, roster: &Roster, id: usize, pos: Position) {
    grid.cell(pos).occupy(id).await;
    roster.set_position(id, pos);
}

#[tokio::test]
async fn test_lock_is_exclusive_until_released() {
    let roster = Arc::new(Roster::new(1, 0));
    let grid = grid(2, 2, &roster);
    let cell = grid.cell(Position::new(1, 1));

    assert!(cell.try_lock().await);
    assert!(!cell.try_lock().await);

    cell.unlock().await;
    assert!(cell.try_lock().await);

    let snapshot = cell.inspect().await.unwrap();
    assert!(snapshot.locked);
    assert_eq!(snapshot.occupant, None);
}

#[tokio::test]
async fn test_occupied_and_trapped_are_independent() {
    let roster = Arc::new(Roster::new(1, 0));
    let grid = grid(3, 3, &roster);
    let pos = Position::new(2, 0);
    let cell = grid.cell(pos);

    cell.add_trap(Trap::new(9, pos)).await;
    place(&grid, &roster, 0, pos).await;

    assert!(cell.check_trap().await);
    assert!(cell.is_occupied().await);
    assert_eq!(cell.occupant().await, Some(0));
    assert!(!cell.inspect().await.unwrap().locked);

    cell.clear().await;
    assert!(!cell.is_occupied().await);
    assert!(cell.check_trap().await);
}

#[tokio::test]
async fn test_store_trace_prefers_occupant_over_trap() {
    let roster = Arc::new(Roster::new(1, 0));
    let grid = grid(3, 3, &roster);
    let pos = Position::new(1, 2);
    let cell = grid.cell(pos);

    // empty, untrapped cell records nothing
    cell.store_trace().await;
    assert!(cell.export_traces().await.is_empty());

    cell.add_trap(Trap::new(5, pos)).await;
    cell.store_trace().await;
    place(&grid, &roster, 0, pos).await;
    cell.store_trace().await;
    cell.clear().await;
    cell.store_trace().await;

    let traces = cell.export_traces().await;
    let records: Vec<(usize, char)> = traces.iter().map(|t| (t.id, t.symbol)).collect();
    assert_eq!(records, vec![(5, TRAP_SYMBOL), (0, 'A'), (5, TRAP_SYMBOL)]);
    assert!(traces.iter().all(|t| t.position == pos));
    assert!(traces.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn test_export_is_a_snapshot() {
    let roster = Arc::new(Roster::new(1, 0));
    let grid = grid(2, 1, &roster);
    let pos = Position::new(0, 0);
    let cell = grid.cell(pos);
    place(&grid, &roster, 0, pos).await;

    cell.store_trace().await;
    let first = cell.export_traces().await;
    cell.store_trace().await;

    assert_eq!(first.len(), 1);
    assert_eq!(cell.export_traces().await.len(), 2);
}

#[tokio::test]
async fn test_expired_lock_request_never_takes_the_lock() {
    let roster = Arc::new(Roster::new(1, 0));
    let grid = Grid::spawn(
        BoardSize::new(1, 1),
        roster.clone(),
        Clock::start(),
        settings(Duration::ZERO),
        1,
    );
    let cell = grid.cell(Position::new(0, 0));

    // With a zero deadline the reply may or may not make it; either way the
    // caller's view and the cell's state must agree.
    for _ in 0..50 {
        let granted = cell.try_lock().await;
        let locked = cell.inspect().await.unwrap().locked;
        assert_eq!(granted, locked);
        if granted {
            cell.unlock().await;
        }
    }
}

#[tokio::test]
async fn test_move_wild_tenant_without_tenant_succeeds_trivially() {
    let roster = Arc::new(Roster::new(1, 1));
    let grid = grid(3, 3, &roster);
    let center = Position::new(1, 1);

    assert!(grid.move_wild_tenant(center).await);

    place(&grid, &roster, 0, center).await;
    assert!(grid.move_wild_tenant(center).await);
    assert_eq!(grid.cell(center).occupant().await, Some(0));
}

#[tokio::test]
async fn test_wild_tenant_relocates_to_the_only_free_neighbor() {
    let roster = Arc::new(Roster::new(0, 1));
    let grid = grid(3, 3, &roster);
    let center = Position::new(1, 1);
    place(&grid, &roster, 0, center).await;

    let neighbors = grid.size().neighbors(center);
    for pos in neighbors {
        assert!(grid.cell(pos).try_lock().await);
    }
    assert!(!grid.move_wild_tenant(center).await);
    assert_eq!(grid.cell(center).occupant().await, Some(0));
    assert_eq!(roster.position(0), center);

    let free = Position::new(1, 0);
    grid.cell(free).unlock().await;
    assert!(grid.move_wild_tenant(center).await);

    // the reply precedes the commit; a query to the source cell waits for it
    assert_eq!(grid.cell(center).occupant().await, None);
    assert_eq!(roster.position(0), free);
    let destination = grid.cell(free).inspect().await.unwrap();
    assert_eq!(destination.occupant, Some(0));
    assert!(!destination.locked);

    let traces = grid.cell(free).export_traces().await;
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].position, free);
    assert_eq!(traces[0].symbol, '0');
}

#[tokio::test]
async fn test_relocation_is_logged_only_at_the_destination() {
    let roster = Arc::new(Roster::new(0, 1));
    let grid = grid(3, 3, &roster);
    let center = Position::new(1, 1);
    place(&grid, &roster, 0, center).await;

    assert!(grid.move_wild_tenant(center).await);

    let source = grid.cell(center).inspect().await.unwrap();
    assert_eq!(source.occupant, None);
    assert_eq!(source.trace_count, 0);
    assert!(grid.cell(center).export_traces().await.is_empty());

    let refuge = roster.position(0);
    assert_ne!(refuge, center);
    let logged: Vec<_> = grid
        .snapshot()
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.trace_count > 0)
        .map(|c| c.position)
        .collect();
    assert_eq!(logged, vec![refuge]);
}

#[tokio::test]
async fn test_wild_tenant_relocated_onto_trap_is_removed_and_seals_the_cell() {
    let roster = Arc::new(Roster::new(0, 1));
    let grid = grid(3, 3, &roster);
    let center = Position::new(1, 1);
    let trap_pos = Position::new(2, 1);
    place(&grid, &roster, 0, center).await;
    grid.cell(trap_pos).add_trap(Trap::new(7, trap_pos)).await;

    for pos in grid.size().neighbors(center) {
        if pos != trap_pos {
            assert!(grid.cell(pos).try_lock().await);
        }
    }

    assert!(grid.move_wild_tenant(center).await);
    assert_eq!(grid.cell(center).occupant().await, None);

    let tenant = roster.get(0).unwrap();
    assert!(tenant.position.is_removed());
    assert_eq!(tenant.symbol, TRIGGERED_TENANT_SYMBOL);

    let trapped = grid.cell(trap_pos).inspect().await.unwrap();
    assert_eq!(trapped.occupant, None);
    assert!(trapped.locked);

    let traces = grid.cell(trap_pos).export_traces().await;
    let records: Vec<(usize, Position, char)> =
        traces.iter().map(|t| (t.id, t.position, t.symbol)).collect();
    assert_eq!(
        records,
        vec![
            (0, trap_pos, TRIGGERED_TENANT_SYMBOL),
            (7, trap_pos, TRAP_SYMBOL)
        ]
    );
}

#[tokio::test]
async fn test_neighbors_skip_the_cell_itself() {
    let roster = Arc::new(Roster::new(0, 0));
    let grid = grid(2, 1, &roster);
    let neighbors = grid.neighbors(Position::new(0, 0));
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].position(), Position::new(1, 0));
}

#[tokio::test]
async fn test_export_sends_only_non_empty_logs() {
    let roster = Arc::new(Roster::new(1, 0));
    let grid = grid(3, 2, &roster);
    place(&grid, &roster, 0, Position::new(2, 1)).await;
    grid.cell(Position::new(2, 1)).store_trace().await;
    let trap_pos = Position::new(0, 0);
    grid.cell(trap_pos).add_trap(Trap::new(3, trap_pos)).await;
    grid.cell(trap_pos).store_trace().await;

    let (queue, mut receiver) = tokio::sync::mpsc::channel(16);
    let summary = grid.export_traces(&queue).await;
    drop(queue);

    let mut batches = Vec::new();
    while let Some(batch) = receiver.recv().await {
        batches.push(batch);
    }
    assert_eq!(summary.batches, 2);
    assert_eq!(summary.traces, 2);
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.len() == 1));

    grid.shutdown().await;
}
