//! Line commands typed at the prompt.
//!
//! Row numbers refer to the rows of the last rendered list (1-based), so
//! parsing needs the current view model.

use thiserror::Error;
use tracker_core::{AppViewModel, EditField, Msg, RecordFields, RecordId, Status, UserId};

pub const HELP: &str = "\
commands:
  login <user>            sign in
  logout                  sign out
  refresh                 reload jobs from the store
  add                     open the new-job form
  quick <title> @ <company>
                          add a job without the form
  edit <n>                open job n in the form
  set <field> <value>     edit a form field (title, company, status, url, notes)
  save | cancel | esc     submit, cancel or dismiss the form
  status <n> <status>     change the status of job n
  delete <n>              delete job n
  filter all | <status>   show all jobs or toggle a status filter
  dismiss                 clear the error banner
  remote <title> @ <company>
                          simulate a change from another client (memory backend)
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Msg),
    /// Insert through the store directly, as another client would.
    RemoteInsert(RecordFields),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command {0:?}, type `help`")]
    Unknown(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("{0:?} is not a row number")]
    BadRow(String),
    #[error("no row {0} in the current list")]
    NoSuchRow(usize),
    #[error("{0}")]
    Invalid(String),
}

pub fn parse(line: &str, view: &AppViewModel) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "login" => Command::Dispatch(Msg::SignedIn(UserId::new(required(rest, "user")?))),
        "logout" => Command::Dispatch(Msg::SignedOut),
        "refresh" => Command::Dispatch(Msg::RefreshRequested),
        "add" => Command::Dispatch(Msg::ComposeStarted),
        "quick" => Command::Dispatch(Msg::CreateRequested(title_at_company(rest)?)),
        "remote" => Command::RemoteInsert(title_at_company(rest)?),
        "edit" => Command::Dispatch(Msg::EditStarted(row(view, rest)?)),
        "set" => {
            let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let field: EditField = required(field, "field")?
                .parse()
                .map_err(CommandError::Invalid)?;
            Command::Dispatch(Msg::FieldEdited {
                field,
                value: value.trim().to_string(),
            })
        }
        "save" => Command::Dispatch(Msg::SubmitClicked),
        "cancel" => Command::Dispatch(Msg::EditCancelled),
        "esc" => Command::Dispatch(Msg::EditDismissed),
        "status" => {
            let (index, status) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let id = row(view, index)?;
            let status = parse_status(required(status, "status")?)?;
            Command::Dispatch(Msg::StatusChangeRequested { id, status })
        }
        "delete" | "rm" => Command::Dispatch(Msg::DeleteRequested { id: row(view, rest)? }),
        "filter" => match required(rest, "filter")? {
            all if all.eq_ignore_ascii_case("all") => Command::Dispatch(Msg::FilterAllSelected),
            status => Command::Dispatch(Msg::FilterToggled(parse_status(status)?)),
        },
        "dismiss" => Command::Dispatch(Msg::ErrorDismissed),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required<'a>(value: &'a str, what: &'static str) -> Result<&'a str, CommandError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CommandError::MissingArgument(what))
    } else {
        Ok(value)
    }
}

fn parse_status(value: &str) -> Result<Status, CommandError> {
    value
        .parse()
        .map_err(|err: tracker_core::ValidationError| CommandError::Invalid(err.to_string()))
}

fn title_at_company(rest: &str) -> Result<RecordFields, CommandError> {
    let (title, company) = rest
        .split_once('@')
        .ok_or(CommandError::MissingArgument("`<title> @ <company>`"))?;
    Ok(RecordFields::new(
        required(title, "title")?,
        required(company, "company")?,
        Status::default(),
    ))
}

fn row(view: &AppViewModel, arg: &str) -> Result<RecordId, CommandError> {
    let arg = required(arg, "row number")?;
    let index: usize = arg
        .parse()
        .map_err(|_| CommandError::BadRow(arg.to_string()))?;
    index
        .checked_sub(1)
        .and_then(|i| view.records.get(i))
        .map(|row| row.record.id.clone())
        .ok_or(CommandError::NoSuchRow(index))
}
