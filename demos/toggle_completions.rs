//! This is an example of how smart-task-scheduler can be used.
//! This binary fills a local task service, then toggles all completion statuses of the tasks it finds.

use std::error::Error;

use chrono::Local;

use smart_task_scheduler::account;
use smart_task_scheduler::cache::LocalTaskService;
use smart_task_scheduler::format::print_projection;
use smart_task_scheduler::traits::AuthService;
use smart_task_scheduler::{Due, Priority, TaskList};

const USERNAME: &str = "demo";
const PASSWORD: &str = "secret_password";


#[tokio::main]
async fn main() {
    env_logger::init();

    println!("This example shows how a task list is fetched and re-fetched after every change.");
    println!("You can set the RUST_LOG environment variable to display more info about the requests.");
    println!();

    if let Err(err) = toggle_all_tasks().await {
        log::error!("Example failed: {}", err);
    }
}

async fn toggle_all_tasks() -> Result<(), Box<dyn Error>> {
    let service = LocalTaskService::new();
    service.register(USERNAME, "demo@example.com", PASSWORD).await?;
    let session = account::login(&service, USERNAME, PASSWORD).await?;

    let mut list = TaskList::new(&service, session);
    list.add_task("Buy groceries", Due::from_form(Some("2024-01-10"), Some("18:00"))?, Some(Priority::Medium)).await?;
    list.add_task("Submit report", Due::from_form(Some("2024-01-10"), Some("09:00"))?, Some(Priority::Urgent)).await?;
    list.add_task("Call the plumber", Due::from_form(Some("2024-01-10"), Some("09:00"))?, Some(Priority::Low)).await?;
    list.add_task("Read a book", None, None).await?;

    let now = Local::now().naive_local();
    println!("---- before -----");
    print_projection(list.refresh().await?, now);

    let to_toggle: Vec<_> = list.refresh().await?
        .tasks()
        .map(|t| (t.id().clone(), t.completed()))
        .collect();
    for (id, completed) in &to_toggle {
        list.toggle_completion(id, !completed).await?;
    }
    println!("{} items toggled.", to_toggle.len());

    println!("---- after -----");
    if let Some(projection) = list.projection() {
        print_projection(projection, now);
    }

    Ok(())
}
