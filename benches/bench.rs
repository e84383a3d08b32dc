use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bst_set::linked::Tree;

/// Returns how many nodes are needed to fill a binary tree with `num_levels` levels.
fn num_nodes_in_full_tree(num_levels: usize) -> usize {
    2usize.pow(num_levels as u32) - 1
}

/// Builds a tree by inserting values in an unbalanced manner. This adds elements in an
/// ascending manner to ensure the tree is unbalanced, degenerating into a list.
fn get_unbalanced_tree(num_levels: usize) -> Tree<i32> {
    let mut tree = Tree::new();
    for x in 0..num_nodes_in_full_tree(num_levels) {
        tree.insert(x as i32);
    }

    tree
}

/// Builds a tree by inserting values in a balanced manner. This adds elements so that, without
/// any self-balancing, the resultant tree will still be balanced.
///
/// It ensures there are `num_levels` of nodes, all full.
fn get_balanced_tree(num_levels: usize) -> Tree<i32> {
    let mut tree = Tree::new();
    let xs = (0..num_nodes_in_full_tree(num_levels) as i32).collect::<Vec<_>>();
    fill_balanced_tree(&mut tree, &xs);

    tree
}

/// Recursive helper for [`get_balanced_tree`].
fn fill_balanced_tree(tree: &mut Tree<i32>, xs: &[i32]) {
    if !xs.is_empty() {
        let mid = xs.len() / 2;
        tree.insert(xs[mid]);
        fill_balanced_tree(tree, &xs[..mid]);
        fill_balanced_tree(tree, &xs[mid + 1..]);
    }
}

/// Helper to bench a function on a BST.
/// It creates a group for the given name and closure and runs tests for various sizes and
/// shapes of BSTs before finishing the group.
fn bench_helper(c: &mut Criterion, name: &str, f: impl Fn(&mut Tree<i32>, i32)) {
    let mut group = c.benchmark_group(name);

    // For trees of size 2^3, 2^7, etc....
    for num_levels in [3, 7, 11, 15] {
        // TODO consider `max` method on BST.
        let largest_element_in_tree = num_nodes_in_full_tree(num_levels) as i32 - 1;

        // Test unbalanced and balanced trees.
        let tree_tests = [
            ("unbalanced", get_unbalanced_tree(num_levels)),
            ("balanced", get_balanced_tree(num_levels)),
        ];
        for (shape, tree) in tree_tests {
            let id = BenchmarkId::new(shape, largest_element_in_tree);

            group.bench_function(id, |b| {
                b.iter_custom(|iters| {
                    let mut time = std::time::Duration::ZERO;
                    for _ in 0..iters {
                        let mut tree = black_box(tree.clone());
                        let instant = std::time::Instant::now();
                        f(&mut tree, black_box(largest_element_in_tree));
                        let elapsed = instant.elapsed();
                        time += elapsed;
                    }
                    time
                })
            });
        }
    }

    group.finish();
}

/// Test BSTs. All tests are run against balanced and unbalanced trees of various sizes and test
/// successful and unsuccessful actions.
pub fn criterion_benchmark(c: &mut Criterion) {
    bench_helper(c, "contains", |tree, i| {
        let _found = black_box(tree.contains(&i));
    });
    bench_helper(c, "remove", |tree, i| {
        tree.remove(&i);
    });

    bench_helper(c, "insert", |tree, i| {
        tree.insert(i + 1);
    });

    bench_helper(c, "contains-miss", |tree, i| {
        let _found = black_box(tree.contains(&(i + 1)));
    });
    bench_helper(c, "remove-miss", |tree, i| {
        tree.remove(&(i + 1));
    });

    bench_helper(c, "iter", |tree, _i| {
        let _count = black_box(tree.iter().count());
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
