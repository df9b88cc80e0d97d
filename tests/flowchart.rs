//! Flow-chart integration tests against the toy ISA oracle.
//!
//! Covers the end-to-end construction scenarios: straight-line functions,
//! conditional returns, range append with id renumbering, external block
//! discovery, and the generic graph properties every chart must satisfy.

mod common;

use common::ToyIsa;
use flowscope::prelude::*;

fn build(oracle: &ToyIsa, range: (u64, u64), flags: ChartFlags) -> FlowChart {
    FlowChart::build(
        "test",
        oracle,
        AddrRange::new(range.0, range.1),
        flags,
        &CancelToken::new(),
    )
}

#[test]
fn test_straight_line_function() {
    // nop; nop; ret
    let oracle = ToyIsa::new(0x1000, &[0x00, 0x00, 0x01]);
    let chart = build(&oracle, (0x1000, 0x1003), ChartFlags::empty());

    assert_eq!(chart.size(), 1);
    assert_eq!(chart.nproper(), 1);
    let entry = chart.entry();
    assert_eq!(chart.calc_block_type(entry), BlockType::Ret);
    assert_eq!(chart.block(entry).unwrap().range(), AddrRange::new(0x1000, 0x1003));
}

#[test]
fn test_if_return_function() {
    // 0: jcc -> 6; 2: nop x4; 6: ret
    let oracle = ToyIsa::new(0, &[0x03, 0x06, 0x00, 0x00, 0x00, 0x00, 0x01]);
    let chart = build(&oracle, (0, 7), ChartFlags::COMPUTE_PREDS);

    assert_eq!(chart.size(), 3);
    assert_eq!(chart.nproper(), 3);

    let cond = chart.block_at(0).unwrap();
    let merge = chart.block_at(2).unwrap();
    let ret = chart.block_at(6).unwrap();
    assert_eq!(chart.calc_block_type(cond), BlockType::CndRet);
    assert_eq!(chart.calc_block_type(merge), BlockType::Normal);
    assert_eq!(chart.calc_block_type(ret), BlockType::Ret);
    assert!(chart.is_ret_block(cond));

    // The return block joins both arms.
    assert_eq!(chart.npred(ret), 2);
}

#[test]
fn test_succ_pred_inversion_invariant() {
    // A loop with an exit: 0: jcc -> 4; 2: jmp -> 0; 4: ret
    let oracle = ToyIsa::new(0, &[0x03, 0x04, 0x02, 0x00, 0x01]);
    let chart = build(&oracle, (0, 5), ChartFlags::COMPUTE_PREDS);

    for node in chart.nodes() {
        for i in 0..chart.nsucc(node) {
            let succ = chart.succ(node, i);
            let preds: Vec<NodeId> = (0..chart.npred(succ)).map(|k| chart.pred(succ, k)).collect();
            assert!(preds.contains(&node), "missing back edge {node} -> {succ}");
        }
        for i in 0..chart.npred(node) {
            let pred = chart.pred(node, i);
            let succs: Vec<NodeId> = (0..chart.nsucc(pred)).map(|k| chart.succ(pred, k)).collect();
            assert!(succs.contains(&node), "missing forward edge {pred} -> {node}");
        }
    }
}

#[test]
fn test_every_successor_is_a_valid_block() {
    let oracle = ToyIsa::new(0, &[0x03, 0x04, 0x02, 0x00, 0x01]);
    let chart = build(&oracle, (0, 5), ChartFlags::empty());

    for node in chart.nodes() {
        for i in 0..chart.nsucc(node) {
            let succ = chart.succ(node, i);
            assert!(succ.index() < chart.size());
            assert!(chart.exists(succ));
        }
    }
}

#[test]
fn test_path_queries_on_chart() {
    // 0: jcc -> 4; 2: ret; 4: ret
    let oracle = ToyIsa::new(0, &[0x03, 0x04, 0x01, 0x00, 0x01]);
    let chart = build(&oracle, (0, 5), ChartFlags::empty());

    let entry = chart.entry();
    for node in chart.nodes() {
        assert!(chart.path_exists(node, node));
        assert!(chart.path_exists(entry, node));
    }

    // Return blocks cannot reach the entry: the reachability test is
    // directional.
    let ret = chart.block_at(4).unwrap();
    assert!(chart.path_exists(entry, ret));
    assert!(!chart.path_exists(ret, entry));
}

#[test]
fn test_node_iterator_matches_node_qty() {
    let oracle = ToyIsa::new(0, &[0x03, 0x04, 0x01, 0x00, 0x01]);
    let chart = build(&oracle, (0, 5), ChartFlags::empty());

    assert!(chart.node_qty() <= chart.size());
    let visited: Vec<NodeId> = chart.nodes().collect();
    assert_eq!(visited.len(), chart.node_qty());
    // Dense graph: ids 0..size in increasing order, once each.
    let expected: Vec<NodeId> = (0..chart.size()).map(NodeId::new).collect();
    assert_eq!(visited, expected);
}

#[test]
fn test_conditional_return_opcode() {
    // 0: retc; 1: nop; 2: ret
    let oracle = ToyIsa::new(0, &[0x05, 0x00, 0x01]);
    let chart = build(&oracle, (0, 3), ChartFlags::empty());

    let entry = chart.entry();
    assert_eq!(chart.calc_block_type(entry), BlockType::CndRet);
    assert!(chart.is_ret_block(entry));
}

#[test]
fn test_unresolved_indirect_jump() {
    // 0: nop; 1: ijmp
    let oracle = ToyIsa::new(0, &[0x00, 0x06]);
    let chart = build(&oracle, (0, 2), ChartFlags::empty());

    assert_eq!(chart.size(), 1);
    assert_eq!(chart.calc_block_type(chart.entry()), BlockType::IndJump);
}

#[test]
fn test_resolved_jump_table() {
    // 0: tbl 2 [6, 7]; 4: nop; 5: nop; 6: ret; 7: ret
    let oracle = ToyIsa::new(0, &[0x07, 0x02, 0x06, 0x07, 0x00, 0x00, 0x01, 0x01]);
    let chart = build(&oracle, (0, 8), ChartFlags::empty());

    let table = chart.block_at(0).unwrap();
    assert_eq!(chart.calc_block_type(table), BlockType::Normal);
    assert_eq!(chart.nsucc(table), 2);
}

#[test]
fn test_noret_and_error_blocks() {
    // 0: jcc -> 3; 2: halt; 3: nop; 4: <invalid>
    let oracle = ToyIsa::new(0, &[0x03, 0x03, 0x04, 0x00, 0xFF]);
    let chart = build(&oracle, (0, 5), ChartFlags::empty());

    let halt = chart.block_at(2).unwrap();
    assert_eq!(chart.calc_block_type(halt), BlockType::Noret);
    assert!(chart.is_noret_block(halt));

    // The block at 3 runs into invalid bytes.
    let bad = chart.block_at(3).unwrap();
    assert_eq!(chart.calc_block_type(bad), BlockType::Error);
}

#[test]
fn test_external_block_classification() {
    // Range covers only the jump; the target is external and halts.
    let code: Vec<u8> = {
        let mut c = vec![0xFF; 0x12];
        c[0] = 0x02;
        c[1] = 0x10;
        c[0x10] = 0x00;
        c[0x11] = 0x04;
        c
    };
    let oracle = ToyIsa::new(0, &code);
    let chart = build(&oracle, (0, 2), ChartFlags::empty());

    assert_eq!(chart.size(), 2);
    assert_eq!(chart.nproper(), 1);
    let ext = chart.block_at(0x10).unwrap();
    assert_eq!(chart.calc_block_type(ext), BlockType::ENoret);
}

#[test]
fn test_append_disjoint_range() {
    // Range 1: 0: jcc -> 0x40; 2: ret. Range 2: 0x40: nop; 0x41: ret.
    let code: Vec<u8> = {
        let mut c = vec![0xFF; 0x42];
        c[0] = 0x03;
        c[1] = 0x40;
        c[2] = 0x01;
        c[0x40] = 0x00;
        c[0x41] = 0x01;
        c
    };
    let oracle = ToyIsa::new(0, &code);

    let mut chart = FlowChart::build(
        "appended",
        &oracle,
        AddrRange::new(0, 3),
        ChartFlags::COMPUTE_PREDS | ChartFlags::NO_EXTERNAL_BLOCKS,
        &CancelToken::new(),
    );
    assert_eq!(chart.size(), 2);
    assert!(!chart.flags().contains(ChartFlags::APPENDED));

    chart.append_range(&oracle, AddrRange::new(0x40, 0x42), &CancelToken::new());

    assert!(chart.flags().contains(ChartFlags::APPENDED));
    assert_eq!(chart.size(), 3);
    assert_eq!(chart.nproper(), 3);

    // Unrelated block ids are unchanged.
    let cond = chart.block_at(0).unwrap();
    let ret = chart.block_at(2).unwrap();
    assert_eq!(cond, NodeId::new(0));
    assert_eq!(ret, NodeId::new(1));

    // The new block's predecessor set includes the original jump block.
    let appended = chart.block_at(0x40).unwrap();
    assert!(chart.block(appended).unwrap().preds().contains(cond));
    assert_eq!(chart.calc_block_type(appended), BlockType::Ret);

    // The jump block now sees a resolved returning arm plus a fall-through
    // arm, which is the conditional-return shape.
    assert_eq!(chart.calc_block_type(cond), BlockType::CndRet);
}

#[test]
fn test_append_then_classification_updates() {
    // nops run off the range end, then the continuation is appended.
    let oracle = ToyIsa::new(0, &[0x00, 0x00, 0x00, 0x01]);
    let mut chart = build(&oracle, (0, 3), ChartFlags::empty());

    let head = chart.entry();
    assert_eq!(chart.calc_block_type(head), BlockType::Error);

    chart.append_range(&oracle, AddrRange::new(3, 4), &CancelToken::new());
    assert_eq!(chart.calc_block_type(head), BlockType::Normal);
    assert_eq!(
        chart.calc_block_type(chart.block_at(3).unwrap()),
        BlockType::Ret
    );
}

#[test]
fn test_multirange_chart() {
    let code: Vec<u8> = {
        let mut c = vec![0xFF; 0x22];
        c[0] = 0x02; // jmp -> 0x20
        c[1] = 0x20;
        c[0x20] = 0x00;
        c[0x21] = 0x01;
        c
    };
    let oracle = ToyIsa::new(0, &code);

    let chart = FlowChart::build_multirange(
        "multi",
        &oracle,
        &[AddrRange::new(0, 2), AddrRange::new(0x20, 0x22)],
        ChartFlags::COMPUTE_PREDS,
        &CancelToken::new(),
    );

    assert_eq!(chart.size(), 2);
    assert_eq!(chart.nproper(), 2);
    assert_eq!(chart.bounds(), AddrRange::new(0, 0x22));
    let head = chart.block_at(0).unwrap();
    let tail = chart.block_at(0x20).unwrap();
    assert!(chart.path_exists(head, tail));
    assert!(!chart.path_exists(tail, head));
}

#[test]
fn test_cancelled_build_is_partial_not_error() {
    let oracle = ToyIsa::new(0, &[0x00, 0x01]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let chart = FlowChart::build("cancelled", &oracle, AddrRange::new(0, 2), ChartFlags::empty(), &cancel);
    assert!(chart.is_empty());
    assert_eq!(chart.nproper(), 0);
}

#[test]
fn test_refresh_rebuilds_after_append() {
    let oracle = ToyIsa::new(0, &[0x00, 0x00, 0x00, 0x01]);
    let mut chart = build(&oracle, (0, 3), ChartFlags::empty());
    chart.append_range(&oracle, AddrRange::new(3, 4), &CancelToken::new());
    assert_eq!(chart.size(), 2);

    chart.refresh(&oracle, &CancelToken::new());

    // The refreshed chart covers both stored ranges.
    assert_eq!(chart.size(), 2);
    assert_eq!(chart.nproper(), 2);
    assert_eq!(chart.calc_block_type(chart.entry()), BlockType::Normal);
}
