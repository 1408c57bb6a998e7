#![cfg(kani)]
//! Kani proof harnesses for the list-splicing model behind rule edits.
//!
//! The harnesses check the splice arithmetic of the editing operations on a
//! model that replaces linked `Arc` chains with fixed-size arrays of node
//! ids, so no heap or recursion is involved.
//!
//! Model:
//! - A response list is `(ids, len)`; `ids[..len]` are the nodes in order.
//! - `move_down(i)` swaps positions `i` and `i + 1` when `i + 1 < len`.
//! - `insert(i, x)` shifts `ids[i..len]` right by one and writes `x` at `i`.
//! - Removing a structural node at `i` replaces it with its nested lists,
//!   `then` followed by `else` (or `body` alone).
//! - Wrapping at `i` moves `ids[i..len]` into the new node's nested list.
//!
//! Run with: `cargo kani --tests --harness <harness_name>`

/// Maximum number of nodes in a modelled list.
const MAX_N: usize = 8;

type List = ([u8; MAX_N], usize);

fn move_down(list: List, i: usize) -> List {
    let (mut ids, len) = list;
    if i + 1 < len {
        ids.swap(i, i + 1);
    }
    (ids, len)
}

fn insert(list: List, i: usize, x: u8) -> List {
    let (mut ids, len) = list;
    let mut k = len;
    while k > i {
        ids[k] = ids[k - 1];
        k -= 1;
    }
    ids[i] = x;
    (ids, len + 1)
}

fn remove_leaf(list: List, i: usize) -> List {
    let (mut ids, len) = list;
    let mut k = i;
    while k + 1 < len {
        ids[k] = ids[k + 1];
        k += 1;
    }
    (ids, len - 1)
}

/// Replace position `i` with `then[..then_len]` followed by
/// `otherwise[..else_len]`.
fn remove_structural(list: List, i: usize, then: List, otherwise: List) -> List {
    let (ids, len) = list;
    let mut out = [0u8; MAX_N * 3];
    let mut n = 0;
    let mut k = 0;
    while k < i {
        out[n] = ids[k];
        n += 1;
        k += 1;
    }
    k = 0;
    while k < then.1 {
        out[n] = then.0[k];
        n += 1;
        k += 1;
    }
    k = 0;
    while k < otherwise.1 {
        out[n] = otherwise.0[k];
        n += 1;
        k += 1;
    }
    k = i + 1;
    while k < len {
        out[n] = ids[k];
        n += 1;
        k += 1;
    }
    let mut result = [0u8; MAX_N];
    let mut r = 0;
    while r < n && r < MAX_N {
        result[r] = out[r];
        r += 1;
    }
    (result, n)
}

/// Wrap position `i`: the outer list keeps `ids[..i]` plus the wrapper, the
/// wrapper's nested list takes `ids[i..len]`.
fn wrap(list: List, i: usize, wrapper: u8) -> (List, List) {
    let (ids, len) = list;
    let mut outer = [0u8; MAX_N];
    let mut inner = [0u8; MAX_N];
    let mut k = 0;
    while k < i {
        outer[k] = ids[k];
        k += 1;
    }
    outer[i] = wrapper;
    k = i;
    while k < len {
        inner[k - i] = ids[k];
        k += 1;
    }
    ((outer, i + 1), (inner, len - i))
}

fn same(a: List, b: List) -> bool {
    if a.1 != b.1 {
        return false;
    }
    let mut k = 0;
    while k < a.1 {
        if a.0[k] != b.0[k] {
            return false;
        }
        k += 1;
    }
    true
}

fn any_list(max: usize) -> List {
    let ids: [u8; MAX_N] = kani::any();
    let len: usize = kani::any();
    kani::assume(len >= 1 && len <= max);
    (ids, len)
}

// ---------------------------------------------------------------------------
// Proof 1: Move down is an involution
//
// Applying `move_down` twice at the same position restores the list.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(10)]
fn move_down_twice_restores() {
    let list = any_list(MAX_N);
    let i: usize = kani::any();
    kani::assume(i < list.1);

    let twice = move_down(move_down(list, i), i);
    kani::assert(same(twice, list), "move_down twice must restore the list");
}

// ---------------------------------------------------------------------------
// Proof 2: Insert then remove is the identity for leaves
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(10)]
fn insert_then_remove_restores() {
    let list = any_list(MAX_N - 1);
    let i: usize = kani::any();
    kani::assume(i <= list.1);
    let x: u8 = kani::any();

    let inserted = insert(list, i, x);
    kani::assert(inserted.1 == list.1 + 1, "insert grows the list by one");
    kani::assert(inserted.0[i] == x, "inserted node sits at the target");
    kani::assert(same(remove_leaf(inserted, i), list), "remove undoes insert");
}

// ---------------------------------------------------------------------------
// Proof 3: Flattening keeps order
//
// Removing a structural node yields prefix, `then`, `else`, suffix with no
// node lost or duplicated.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(10)]
fn flatten_preserves_order() {
    let list = any_list(3);
    let then = any_list(2);
    let otherwise_len: usize = kani::any();
    kani::assume(otherwise_len <= 2);
    let otherwise: List = (kani::any(), otherwise_len);
    let i: usize = kani::any();
    kani::assume(i < list.1);

    let result = remove_structural(list, i, then, otherwise);
    kani::assert(
        result.1 == list.1 - 1 + then.1 + otherwise.1,
        "every nested node is promoted",
    );
    kani::assert(result.0[i] == then.0[0], "then head takes the removed position");
    if i + 1 < list.1 {
        kani::assert(
            result.0[i + then.1 + otherwise.1] == list.0[i + 1],
            "successor follows the promoted nodes",
        );
    }
}

// ---------------------------------------------------------------------------
// Proof 4: Wrap then remove is the identity
//
// Wrapping absorbs the target and its successors; removing the wrapper
// promotes them back.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(10)]
fn wrap_then_remove_restores() {
    let list = any_list(MAX_N);
    let i: usize = kani::any();
    kani::assume(i < list.1);
    let wrapper: u8 = kani::any();

    let (outer, inner) = wrap(list, i, wrapper);
    kani::assert(outer.1 == i + 1, "wrapper is the last node of its list");
    let restored = remove_structural(outer, i, inner, ([0; MAX_N], 0));
    kani::assert(same(restored, list), "removing the wrapper restores the list");
}
