use mediapress_core::{update, Batch, MediaKind, Msg};

#[test]
fn tick_and_noop_change_nothing() {
    let batch = Batch::new(MediaKind::Image);
    let (mut batch, effects) = update(batch, Msg::Tick);
    assert!(effects.is_empty());
    assert!(!batch.consume_dirty());

    let (mut batch, effects) = update(batch, Msg::NoOp);
    assert!(effects.is_empty());
    assert!(!batch.consume_dirty());
}
