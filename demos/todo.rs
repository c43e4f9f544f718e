//! Demonstration of Store for managing complex state

use tindux::{Action, Reduction, Store, StoreError};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct TodoItem {
    id: usize,
    title: String,
    completed: bool,
}

#[derive(Clone, Debug)]
struct AppState {
    todos: Vec<TodoItem>,
    filter: TodoFilter,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum TodoFilter {
    All,
    Active,
    Completed,
}

#[derive(Clone, Debug)]
enum TodoAction {
    Add(String),
    Toggle(usize),
    SetFilter(TodoFilter),
}

impl Action for TodoAction {
    fn kind(&self) -> &str {
        match self {
            TodoAction::Add(_) => "ADD_TODO",
            TodoAction::Toggle(_) => "TOGGLE_TODO",
            TodoAction::SetFilter(_) => "SET_FILTER",
        }
    }
}

impl AppState {
    fn new() -> Self {
        Self {
            todos: Vec::new(),
            filter: TodoFilter::All,
        }
    }

    fn filtered_todos(&self) -> Vec<&TodoItem> {
        match self.filter {
            TodoFilter::All => self.todos.iter().collect(),
            TodoFilter::Active => self.todos.iter().filter(|t| !t.completed).collect(),
            TodoFilter::Completed => self.todos.iter().filter(|t| t.completed).collect(),
        }
    }

    fn stats(&self) -> (usize, usize, usize) {
        let total = self.todos.len();
        let completed = self.todos.iter().filter(|t| t.completed).count();
        let active = total - completed;
        (total, active, completed)
    }
}

fn reducer(state: &AppState, action: &TodoAction) -> Reduction<AppState> {
    let mut next = state.clone();
    match action {
        TodoAction::Add(title) => {
            let id = next.todos.len();
            next.todos.push(TodoItem {
                id,
                title: title.clone(),
                completed: false,
            });
        }
        TodoAction::Toggle(id) => match next.todos.iter_mut().find(|t| t.id == *id) {
            Some(todo) => todo.completed = !todo.completed,
            None => return Reduction::failed(next, format!("no todo with id {id}")),
        },
        TodoAction::SetFilter(filter) => next.filter = *filter,
    }
    Reduction::ok(next)
}

#[tokio::main]
async fn main() -> Result<(), StoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Store Example: Todo App ===\n");

    let store = Store::new(AppState::new(), reducer)?;

    println!("1. Watching the latest stats");
    let mut latest = store.watch();
    let watcher = tokio::spawn(async move {
        while latest.changed().await.is_ok() {
            let (total, active, completed) = latest.borrow_and_update().stats();
            println!(
                "   [Store Update] Total: {}, Active: {}, Completed: {}",
                total, active, completed
            );
        }
    });

    println!("\n2. Adding todos");
    for title in ["Learn Rust", "Build reducer store", "Write documentation"] {
        store.dispatch(TodoAction::Add(title.to_string())).await?;
    }

    println!("\n3. Completing the first two todos");
    store.dispatch(TodoAction::Toggle(0)).await?;
    store.dispatch(TodoAction::Toggle(1)).await?;

    println!("\n4. Toggling a todo that doesn't exist");
    if let Err(e) = store.dispatch(TodoAction::Toggle(42)).await {
        println!("   Reducer said: {e}");
    }

    println!("\n5. Active todos:");
    store.dispatch(TodoAction::SetFilter(TodoFilter::Active)).await?;
    store.read(|state| {
        for todo in state.filtered_todos() {
            println!("   [ ] {}", todo.title);
        }
    });

    println!("\n6. Completed todos:");
    store.dispatch(TodoAction::SetFilter(TodoFilter::Completed)).await?;
    store.read(|state| {
        for todo in state.filtered_todos() {
            println!("   [✓] {}", todo.title);
        }
    });

    store.close().await;
    drop(store);
    let _ = watcher.await;

    println!("\n✓ Example complete!");
    Ok(())
}
