use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::{
    dashboard::{Dashboard, EditUserForm, PageChange},
    error::Error,
    model::{InvitedUser, Role},
    state::{InviteState, ProjectState},
};

//Rendering helpers. These format state into text and carry no business
//logic.

pub fn render_listing(state: &InviteState) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<4} {:<36} {:<20} {:<28} {:<12}\n",
        "#", "UUID", "Name", "Email", "Role"
    ));
    if state.loading {
        out.push_str("Loading...\n");
        return out;
    }
    if let Some(error) = state.error.as_ref() {
        out.push_str(&format!("Error: {}\n", error));
        return out;
    }
    if state.listing.rows.is_empty() {
        out.push_str("No users found.\n");
    } else {
        let offset = (state.listing.page.saturating_sub(1)) * state.listing.limit;
        for (index, user) in state.listing.rows.iter().enumerate() {
            out.push_str(&format!(
                "{:<4} {:<36} {:<20} {:<28} {:<12}\n",
                offset as usize + index + 1,
                user.get_uuid(),
                user.get_name(),
                user.get_email(),
                user.get_role()
            ));
        }
    }
    out.push_str(&render_pagination(
        state.listing.page,
        state.listing.total_pages,
    ));
    out
}

pub fn render_pagination(page: u32, total_pages: u32) -> String {
    let previous = if page > 1 { "<" } else { " " };
    let next = if page < total_pages { ">" } else { " " };
    format!("{} page {} of {} {}\n", previous, page, total_pages, next)
}

pub fn render_projects(state: &ProjectState) -> String {
    let mut out = String::new();
    if state.loading {
        out.push_str("Loading...\n");
        return out;
    }
    if let Some(error) = state.error.as_ref() {
        out.push_str(&format!("Error: {}\n", error));
        return out;
    }
    let listed = if state.search_results.is_empty() {
        &state.projects
    } else {
        &state.search_results
    };
    if listed.is_empty() {
        out.push_str("No projects.\n");
    }
    for project in listed.iter() {
        out.push_str(&format!(
            "{:<36} {}\n",
            project.get_uuid(),
            project.get_name()
        ));
    }
    out
}

pub fn render_roles(roles: &[Role]) -> String {
    let mut out = String::new();
    if roles.is_empty() {
        out.push_str("No roles.\n");
    }
    for role in roles.iter() {
        out.push_str(&format!("{:<36} {}\n", role.get_uuid(), role.get_display_name()));
    }
    out
}

const HELP: &str = "\
commands:
  project <uuid>           set the form project
  email <a@x.com[, ...]>   set the form email(s), comma separated
  role <role>              set the form role (super_admin | admin | member)
  submit                   send the invite
  search [text]            filter the listing (empty clears the filter)
  next | prev              change page
  resend <row>             re-send the invite on that row
  edit <row> [name=..] [email=..] [role=..]
  projects [text]          list or search projects
  roles                    list roles
  show                     redraw the listing and form
  quit                     exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Project(String),
    Email(String),
    Role(String),
    Submit,
    Search(String),
    Next,
    Previous,
    Resend(usize),
    Edit { row: usize, form: CommandEditForm },
    Projects(Option<String>),
    Roles,
    Show,
    Help,
    Quit,
}

///Edit fields as parsed off the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandEditForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };
        match keyword {
            "project" if !rest.is_empty() => Ok(Self::Project(rest.to_owned())),
            "email" if !rest.is_empty() => Ok(Self::Email(rest.to_owned())),
            "role" if !rest.is_empty() => Ok(Self::Role(rest.to_owned())),
            "submit" => Ok(Self::Submit),
            "search" => Ok(Self::Search(rest.to_owned())),
            "next" => Ok(Self::Next),
            "prev" | "previous" => Ok(Self::Previous),
            "resend" => match rest.parse::<usize>() {
                Ok(row) if row > 0 => Ok(Self::Resend(row)),
                _ => Err("usage: resend <row>".to_owned()),
            },
            "edit" => Self::parse_edit(rest),
            "projects" => Ok(Self::Projects(if rest.is_empty() {
                None
            } else {
                Some(rest.to_owned())
            })),
            "roles" => Ok(Self::Roles),
            "show" => Ok(Self::Show),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(format!("unknown command: {} (try help)", keyword)),
        }
    }

    fn parse_edit(rest: &str) -> Result<Self, String> {
        let mut parts = rest.split_whitespace();
        let row = match parts.next().and_then(|raw| raw.parse::<usize>().ok()) {
            Some(row) if row > 0 => row,
            _ => return Err("usage: edit <row> [name=..] [email=..] [role=..]".to_owned()),
        };
        let mut form = CommandEditForm::default();
        for part in parts {
            match part.split_once('=') {
                Some(("name", value)) => form.name = Some(value.to_owned()),
                Some(("email", value)) => form.email = Some(value.to_owned()),
                Some(("role", value)) => form.role = Some(value.to_owned()),
                _ => return Err(format!("unknown edit field: {}", part)),
            }
        }
        if form.name.is_none() && form.email.is_none() && form.role.is_none() {
            return Err("edit needs at least one of name=, email=, role=".to_owned());
        }
        Ok(Self::Edit { row, form })
    }
}

fn row_on_current_page(state: &InviteState, row: usize) -> Option<InvitedUser> {
    state.listing.rows.get(row - 1).cloned()
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

///Reads line commands from stdin and maps them onto dashboard calls until
///quit or end of input.
pub async fn run(dashboard: Arc<Dashboard>) -> Result<(), Error> {
    dashboard.mount().await;
    println!("invite console (help for commands)");
    println!("{}", render_listing(&dashboard.get_invites().snapshot().await));
    prompt();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(usage) => {
                println!("{}", usage);
                prompt();
                continue;
            }
        };
        match command {
            Command::Quit => break,
            other => execute(&dashboard, other).await,
        }
        prompt();
    }
    info!("console session ended");
    Ok(())
}

async fn execute(dashboard: &Arc<Dashboard>, command: Command) {
    match command {
        Command::Project(project_uuid) => {
            dashboard.set_form_project(&project_uuid).await;
            println!("project set");
        }
        Command::Email(email) => {
            dashboard.set_form_email(&email).await;
            println!("email set");
        }
        Command::Role(role) => {
            dashboard.set_form_role(&role).await;
            println!("role set");
        }
        Command::Submit => match dashboard.submit().await {
            Ok(()) => {
                println!("invite sent");
                println!("{}", render_listing(&dashboard.get_invites().snapshot().await));
            }
            Err(err) => println!("invite failed: {}", err),
        },
        Command::Search(term) => {
            dashboard.set_search_term(&term).await;
            dashboard.settled().await;
            println!("{}", render_listing(&dashboard.get_invites().snapshot().await));
        }
        Command::Next | Command::Previous => {
            let change = if matches!(command, Command::Next) {
                PageChange::Next
            } else {
                PageChange::Previous
            };
            if let Err(err) = dashboard.change_page(change).await {
                println!("page change failed: {}", err);
            }
            println!("{}", render_listing(&dashboard.get_invites().snapshot().await));
        }
        Command::Resend(row) => {
            let state = dashboard.get_invites().snapshot().await;
            match row_on_current_page(&state, row) {
                Some(user) => match dashboard.resend(&user).await {
                    Ok(()) => println!("invite re-sent to {}", user.get_email()),
                    Err(err) => println!("resend failed: {}", err),
                },
                None => println!("no row {} on this page", row),
            }
        }
        Command::Edit { row, form } => {
            let state = dashboard.get_invites().snapshot().await;
            match row_on_current_page(&state, row) {
                Some(user) => {
                    let form = EditUserForm {
                        name: form.name,
                        email: form.email,
                        role: form.role,
                    };
                    match dashboard.edit(&user, form).await {
                        Ok(()) => {
                            println!("user updated");
                            println!(
                                "{}",
                                render_listing(&dashboard.get_invites().snapshot().await)
                            );
                        }
                        Err(err) => println!("update failed: {}", err),
                    }
                }
                None => println!("no row {} on this page", row),
            }
        }
        Command::Projects(query) => {
            let projects = dashboard.get_projects();
            let result = match query.as_deref() {
                Some(query) => projects.search_projects(query).await,
                None => projects.fetch_projects().await,
            };
            if let Err(err) = result {
                println!("project fetch failed: {}", err);
            }
            println!("{}", render_projects(&projects.snapshot().await));
        }
        Command::Roles => {
            println!(
                "{}",
                render_roles(&dashboard.get_invites().snapshot().await.roles)
            );
        }
        Command::Show => {
            let form = dashboard.get_form().await;
            println!(
                "form: project={} email={} role={}",
                form.project_uuid, form.email, form.role
            );
            println!("{}", render_listing(&dashboard.get_invites().snapshot().await));
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}
