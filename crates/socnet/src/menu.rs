use std::io::{self, BufRead, Write};
use std::path::Path;

use socnet_db::{
    BulkLoader, Database, LoadReport, StatusRow, StoreError, UserCollection, UserStatusCollection,
};
use tracing::{info, warn};

const MENU: &str = "
    A: Load user database
    B: Load status database
    C: Add user
    D: Update user
    E: Search user
    F: Delete user
    G: Add status
    H: Update status
    I: Search status
    J: Delete status
    K: Search all status updates
    L: Search all status updates by a string
    M: Show all flagged status updates
    Q: Quit

    Please enter your choice: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    LoadUsers,
    LoadStatuses,
    AddUser,
    UpdateUser,
    SearchUser,
    DeleteUser,
    AddStatus,
    UpdateStatus,
    SearchStatus,
    DeleteStatus,
    UserStatuses,
    FilterStatuses,
    FlaggedStatuses,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        let cmd = match input.trim().to_ascii_uppercase().as_str() {
            "A" => Command::LoadUsers,
            "B" => Command::LoadStatuses,
            "C" => Command::AddUser,
            "D" => Command::UpdateUser,
            "E" => Command::SearchUser,
            "F" => Command::DeleteUser,
            "G" => Command::AddStatus,
            "H" => Command::UpdateStatus,
            "I" => Command::SearchStatus,
            "J" => Command::DeleteStatus,
            "K" => Command::UserStatuses,
            "L" => Command::FilterStatuses,
            "M" => Command::FlaggedStatuses,
            "Q" => Command::Quit,
            _ => return None,
        };
        Some(cmd)
    }
}

/// Interactive front end over the collections. Reads answers from `input`
/// and writes everything the user sees to `out`.
pub struct Menu<'db, R, W> {
    users: UserCollection<'db>,
    statuses: UserStatusCollection<'db>,
    loader: BulkLoader<'db>,
    input: R,
    out: W,
}

impl<'db, R: BufRead, W: Write> Menu<'db, R, W> {
    pub fn new(db: &'db Database, input: R, out: W) -> Self {
        Self {
            users: UserCollection::new(db),
            statuses: UserStatusCollection::new(db),
            loader: BulkLoader::new(db),
            input,
            out,
        }
    }

    /// Runs until the user quits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            let choice = match self.prompt(MENU) {
                Ok(choice) => choice,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            };

            let Some(cmd) = Command::parse(&choice) else {
                writeln!(self.out, "Invalid option")?;
                continue;
            };
            if cmd == Command::Quit {
                break;
            }

            match self.dispatch(cmd) {
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                other => other?,
            }
        }

        info!("Menu closed");
        Ok(())
    }

    fn dispatch(&mut self, cmd: Command) -> io::Result<()> {
        match cmd {
            Command::LoadUsers => self.load_users(),
            Command::LoadStatuses => self.load_statuses(),
            Command::AddUser => self.add_user(),
            Command::UpdateUser => self.update_user(),
            Command::SearchUser => self.search_user(),
            Command::DeleteUser => self.delete_user(),
            Command::AddStatus => self.add_status(),
            Command::UpdateStatus => self.update_status(),
            Command::SearchStatus => self.search_status(),
            Command::DeleteStatus => self.delete_status(),
            Command::UserStatuses => self.user_statuses(),
            Command::FilterStatuses => self.filter_statuses(),
            Command::FlaggedStatuses => self.flagged_statuses(),
            Command::Quit => Ok(()),
        }
    }

    /// Writes `label` and reads one trimmed line. End of input is reported as
    /// `UnexpectedEof`.
    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(line.trim().to_string())
    }

    fn report(&mut self, result: Result<(), StoreError>, ok: &str, failed: &str) -> io::Result<()> {
        match result {
            Ok(()) => writeln!(self.out, "{}", ok),
            Err(e) => {
                warn!("{}: {}", failed, e);
                writeln!(self.out, "{}", failed)
            }
        }
    }

    fn load_users(&mut self) -> io::Result<()> {
        let filename = self.prompt("Enter filename of user file: ")?;
        let result = self.loader.load_users(Path::new(&filename));
        self.report_load(result, "users")
    }

    fn load_statuses(&mut self) -> io::Result<()> {
        let filename = self.prompt("Enter filename for status file: ")?;
        let result = self.loader.load_statuses(Path::new(&filename));
        self.report_load(result, "status updates")
    }

    fn report_load(
        &mut self,
        result: Result<LoadReport, StoreError>,
        what: &str,
    ) -> io::Result<()> {
        match result {
            Ok(report) => writeln!(
                self.out,
                "Loaded {} {} ({} already present).",
                report.inserted, what, report.skipped
            ),
            Err(StoreError::FileNotFound(path)) => {
                writeln!(self.out, "File {} does not exist.", path.display())
            }
            Err(e) => writeln!(self.out, "Nothing was loaded: {}", e),
        }
    }

    fn add_user(&mut self) -> io::Result<()> {
        let user_id = self.prompt("User ID: ")?;
        let email = self.prompt("User email: ")?;
        let name = self.prompt("User name: ")?;
        let last_name = self.prompt("User last name: ")?;

        let result = self.users.add(&user_id, &email, &name, &last_name);
        self.report(
            result,
            "User was successfully added",
            "An error occurred while trying to add new user",
        )
    }

    fn update_user(&mut self) -> io::Result<()> {
        let user_id = self.prompt("User ID: ")?;
        let email = self.prompt("User email: ")?;
        let name = self.prompt("User name: ")?;
        let last_name = self.prompt("User last name: ")?;

        let result = self.users.modify(&user_id, &email, &name, &last_name);
        self.report(
            result,
            "User was successfully updated",
            "An error occurred while trying to update user",
        )
    }

    fn search_user(&mut self) -> io::Result<()> {
        let user_id = self.prompt("Enter user ID to search: ")?;
        match self.users.search(&user_id) {
            Ok(Some(user)) => {
                writeln!(self.out, "User ID: {}", user.user_id)?;
                writeln!(self.out, "Email: {}", user.user_email)?;
                writeln!(self.out, "Name: {}", user.user_name)?;
                writeln!(self.out, "Last name: {}", user.user_last_name)
            }
            Ok(None) => writeln!(self.out, "ERROR: User does not exist"),
            Err(e) => writeln!(self.out, "An error occurred while searching: {}", e),
        }
    }

    fn delete_user(&mut self) -> io::Result<()> {
        let user_id = self.prompt("User ID: ")?;
        let result = self.users.delete(&user_id);
        self.report(
            result,
            "User was successfully deleted",
            "An error occurred while trying to delete user",
        )
    }

    fn add_status(&mut self) -> io::Result<()> {
        let user_id = self.prompt("User ID: ")?;
        let status_id = self.prompt("Status ID: ")?;
        let text = self.prompt("Status text: ")?;

        let result = self.statuses.add(&status_id, &user_id, &text);
        self.report(
            result,
            "New status was successfully added",
            "An error occurred while trying to add new status",
        )
    }

    fn update_status(&mut self) -> io::Result<()> {
        let user_id = self.prompt("User ID: ")?;
        let status_id = self.prompt("Status ID: ")?;
        let text = self.prompt("Status text: ")?;

        let result = self.statuses.modify(&status_id, &user_id, &text);
        self.report(
            result,
            "Status was successfully updated",
            "An error occurred while trying to update status",
        )
    }

    fn search_status(&mut self) -> io::Result<()> {
        let status_id = self.prompt("Enter status ID to search: ")?;
        match self.statuses.search(&status_id) {
            Ok(Some(status)) => {
                writeln!(self.out, "User ID: {}", status.user_id)?;
                writeln!(self.out, "Status ID: {}", status.status_id)?;
                writeln!(self.out, "Status text: {}", status.status_text)
            }
            Ok(None) => writeln!(self.out, "ERROR: Status does not exist"),
            Err(e) => writeln!(self.out, "An error occurred while searching: {}", e),
        }
    }

    fn delete_status(&mut self) -> io::Result<()> {
        let status_id = self.prompt("Status ID: ")?;
        let result = self.statuses.delete(&status_id);
        self.report(
            result,
            "Status was successfully deleted",
            "An error occurred while trying to delete status",
        )
    }

    fn user_statuses(&mut self) -> io::Result<()> {
        let user_id = self.prompt("User ID: ")?;
        let total = match self.statuses.count_by_user(&user_id) {
            Ok(0) => return writeln!(self.out, "No status updates found for {}", user_id),
            Ok(n) => n,
            Err(e) => return writeln!(self.out, "An error occurred while searching: {}", e),
        };

        writeln!(
            self.out,
            "A total of {} status updates are found for {}",
            total, user_id
        )?;
        let cursor = self.statuses.search_all_by_user(&user_id);
        self.page_through(cursor)
    }

    fn filter_statuses(&mut self) -> io::Result<()> {
        let phrase = self.prompt("Enter a word or phrase to search by: ")?;
        let mut cursor = self.statuses.filter_by_text(&phrase).peekable();
        if cursor.peek().is_none() {
            return writeln!(self.out, "There are no results with that search.");
        }

        writeln!(self.out, "Here are the results:")?;
        self.page_through(cursor)
    }

    /// Shows one status per "Y" answer until the user declines or the
    /// sequence runs out.
    fn page_through<I>(&mut self, mut statuses: I) -> io::Result<()>
    where
        I: Iterator<Item = Result<StatusRow, StoreError>>,
    {
        loop {
            let answer = self.prompt("Would you like to see the next update? (Y/N) ")?;
            if !answer.eq_ignore_ascii_case("y") {
                return Ok(());
            }

            match statuses.next() {
                Some(Ok(status)) => writeln!(self.out, "{}", status.status_text)?,
                Some(Err(e)) => {
                    return writeln!(self.out, "An error occurred while searching: {}", e);
                }
                None => return writeln!(self.out, "There are no more status updates."),
            }
        }
    }

    fn flagged_statuses(&mut self) -> io::Result<()> {
        let phrase = self.prompt("Enter a word or phrase to search by: ")?;
        let flagged = self
            .statuses
            .filter_by_text(&phrase)
            .map(|r| r.map(|s| (s.status_id, s.status_text)))
            .collect::<Result<Vec<_>, _>>();

        match flagged {
            Ok(list) if list.is_empty() => {
                writeln!(self.out, "There are no results with that search.")
            }
            Ok(list) => writeln!(self.out, "{:?}", list),
            Err(e) => writeln!(self.out, "An error occurred while searching: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_script(db: &Database, script: &str) -> String {
        let mut out = Vec::new();
        Menu::new(db, Cursor::new(script.as_bytes()), &mut out)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        UserCollection::new(&db)
            .add("bob123", "bob123@gmail.com", "Bob", "Belcher")
            .unwrap();
        let statuses = UserStatusCollection::new(&db);
        statuses.add("bob123__00001", "bob123", "I love burgers!").unwrap();
        statuses.add("bob123__00002", "bob123", "Jimmy Pesto sux!").unwrap();
        db
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("a"), Some(Command::LoadUsers));
        assert_eq!(Command::parse(" M \n"), Some(Command::FlaggedStatuses));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("Z"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_add_and_search_user() {
        let db = Database::open_in_memory().unwrap();
        let out = run_script(
            &db,
            "C\nlinda123\nlinda@gmail.com\nLinda\nBelcher\n\
             C\nlinda123\nlinda@gmail.com\nLinda\nBelcher\n\
             E\nlinda123\nE\ngene234\nQ\n",
        );

        assert!(out.contains("User was successfully added"));
        assert!(out.contains("An error occurred while trying to add new user"));
        assert!(out.contains("Email: linda@gmail.com"));
        assert!(out.contains("ERROR: User does not exist"));
    }

    #[test]
    fn test_invalid_option_and_eof() {
        let db = Database::open_in_memory().unwrap();
        let out = run_script(&db, "X\n");
        assert!(out.contains("Invalid option"));
    }

    #[test]
    fn test_eof_mid_command_ends_menu() {
        let db = Database::open_in_memory().unwrap();
        run_script(&db, "C\nbob123\n");
        assert!(UserCollection::new(&db).search("bob123").unwrap().is_none());
    }

    #[test]
    fn test_status_with_unknown_user_fails() {
        let db = Database::open_in_memory().unwrap();
        let out = run_script(&db, "G\ngene234\ngene234__00001\nFarts!\nQ\n");
        assert!(out.contains("An error occurred while trying to add new status"));
    }

    #[test]
    fn test_page_through_user_statuses() {
        let db = seeded();
        let out = run_script(&db, "K\nbob123\nY\nY\nY\nQ\n");

        assert!(out.contains("A total of 2 status updates are found for bob123"));
        assert!(out.contains("I love burgers!"));
        assert!(out.contains("Jimmy Pesto sux!"));
        assert!(out.contains("There are no more status updates."));
    }

    #[test]
    fn test_filter_stops_on_no() {
        let db = seeded();
        let out = run_script(&db, "L\nPesto\nN\nL\nsalad\nQ\n");

        assert!(out.contains("Here are the results:"));
        assert!(!out.contains("Jimmy Pesto sux!"));
        assert!(out.contains("There are no results with that search."));
    }

    #[test]
    fn test_flagged_statuses_lists_tuples() {
        let db = seeded();
        let out = run_script(&db, "M\nburger\nQ\n");
        assert!(out.contains(r#"[("bob123__00001", "I love burgers!")]"#));
    }

    #[test]
    fn test_load_missing_file() {
        let db = Database::open_in_memory().unwrap();
        let out = run_script(&db, "A\n/definitely/not/here.csv\nQ\n");
        assert!(out.contains("does not exist"));
    }

    #[test]
    fn test_load_users_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.csv");
        std::fs::write(
            &path,
            "USER_ID,NAME,LASTNAME,EMAIL\ngene234,Gene,Belcher,gene@gmail.com\n",
        )
        .unwrap();

        let db = Database::open_in_memory().unwrap();
        let out = run_script(&db, &format!("A\n{}\nF\ngene234\nQ\n", path.display()));

        assert!(out.contains("Loaded 1 users (0 already present)."));
        assert!(out.contains("User was successfully deleted"));
    }
}
