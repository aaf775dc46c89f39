use std::{collections::VecDeque, fmt};

use crate::{Color, Dir, NodeId, RbTree};

impl<V> RbTree<V> {
    /// Writes the tree as a Graphviz digraph named `name`.
    ///
    /// Nodes are laid out level by level and filled with their color. Absent children are drawn as
    /// points.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item {
            Node(NodeId),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        loop {
            use fmt::Write;
            let remaining = queue.len();
            if remaining == 0 {
                break;
            }

            write!(w, "{{rank=same; ")?;

            for item in queue.drain(..remaining).collect::<Vec<_>>() {
                let node = match item {
                    Item::Node(node) => &self.nodes[node],
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let key = &node.key;
                let fill = match node.color {
                    Color::Red => "red",
                    Color::Black => "black",
                };
                write!(
                    w,
                    "\"graph{name}-{key}\" [label=\"{key}\", style=filled, fillcolor={fill}, fontcolor=white]; "
                )?;

                for dir in [Dir::Left, Dir::Right] {
                    match node.child(dir) {
                        Some(child) => {
                            let child_key = &self.nodes[child].key;

                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
