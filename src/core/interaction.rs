use crate::core::aggregator::{SearchSession, TopSelection};
use crate::domain::model::SortKey;
use crate::domain::ports::PostingStore;
use crate::utils::error::Result;
use std::io::{BufRead, Write};

/// Text menu over a [`SearchSession`]. Construction has no side effects;
/// nothing is read or printed until [`JobSearchApp::run`].
pub struct JobSearchApp<R, W> {
    session: SearchSession,
    stores: Vec<Box<dyn PostingStore>>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> JobSearchApp<R, W> {
    pub fn new(session: SearchSession, stores: Vec<Box<dyn PostingStore>>, input: R, output: W) -> Self {
        Self {
            session,
            stores,
            input,
            output,
        }
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.output, "1. Search vacancies")?;
            writeln!(self.output, "2. Show vacancies")?;
            writeln!(self.output, "3. Save vacancies to files")?;
            writeln!(self.output, "4. Exit")?;

            let Some(choice) = self.prompt("Choose an action: ")? else {
                break;
            };

            match choice.as_str() {
                "1" => {
                    if !self.search_flow().await? {
                        break;
                    }
                }
                "2" => self.display()?,
                "3" => self.save()?,
                "4" => break,
                _ => writeln!(self.output, "Invalid choice. Try again.")?,
            }
        }

        tracing::debug!("Interaction loop finished");
        Ok(())
    }

    /// 回傳 false 代表輸入已結束
    async fn search_flow(&mut self) -> Result<bool> {
        let query = loop {
            match self.prompt("Enter a job title to search: ")? {
                None => return Ok(false),
                Some(query) if query.is_empty() => {
                    writeln!(self.output, "The job title cannot be empty.")?
                }
                Some(query) => break query,
            }
        };

        let report = self.session.search(&query).await;
        for failure in &report.failures {
            writeln!(
                self.output,
                "⚠️ {}: {}",
                failure.source,
                failure.error.user_friendly_message()
            )?;
        }
        writeln!(self.output, "Found {} vacancies.", report.retained)?;

        let count = loop {
            match self.prompt("How many top vacancies to show: ")? {
                None => return Ok(false),
                Some(value) => match value.parse::<usize>() {
                    Ok(count) => break count,
                    Err(_) => writeln!(self.output, "Please enter a whole number.")?,
                },
            }
        };

        let key = loop {
            writeln!(self.output, "1. Sort by date")?;
            writeln!(self.output, "2. Sort by salary")?;
            match self.prompt("Choose sorting: ")?.as_deref() {
                None => return Ok(false),
                Some("1") => break SortKey::Date,
                Some("2") => break SortKey::Salary,
                Some(_) => writeln!(self.output, "Invalid choice. Try again.")?,
            }
        };

        let selection = self.session.select_top(key, count);
        self.print_selection(&selection)?;
        Ok(true)
    }

    fn print_selection(&mut self, selection: &TopSelection) -> Result<()> {
        if selection.shortfall().is_some() {
            writeln!(
                self.output,
                "Unfortunately only {} vacancies were found.",
                selection.available
            )?;
        }
        for posting in &selection.postings {
            writeln!(self.output, "{}", posting)?;
        }
        Ok(())
    }

    fn display(&mut self) -> Result<()> {
        if self.session.postings().is_empty() {
            writeln!(self.output, "No vacancies available.")?;
            return Ok(());
        }

        writeln!(self.output, "Vacancies:")?;
        for posting in self.session.postings() {
            writeln!(self.output, "{}", posting)?;
        }
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        if self.session.postings().is_empty() {
            writeln!(self.output, "No vacancies match the search criteria.")?;
            return Ok(());
        }

        match self.save_postings() {
            Ok(saved) => writeln!(self.output, "Saved {} vacancies to files.", saved)?,
            Err(e) => {
                tracing::error!("❌ Saving vacancies failed: {}", e);
                writeln!(self.output, "❌ {}", e.user_friendly_message())?;
                writeln!(self.output, "💡 {}", e.recovery_suggestion())?;
            }
        }
        Ok(())
    }

    /// Appends every session posting to every store, one posting at a time.
    pub fn save_postings(&self) -> Result<usize> {
        for posting in self.session.postings() {
            for store in &self.stores {
                store.add_posting(posting)?;
            }
        }
        Ok(self.session.postings().len())
    }

    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::currency::StaticRates;
    use crate::adapters::storage::{CsvPostingStore, JsonLinesPostingStore};
    use crate::core::aggregator::SearchMode;
    use crate::core::normalizer::Normalizer;
    use crate::domain::model::{Criteria, RawRecord};
    use crate::domain::ports::VacancySource;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct FixedSource(Vec<serde_json::Value>);

    #[async_trait]
    impl VacancySource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch(&self, _query: &str) -> Result<Vec<RawRecord>> {
            Ok(self
                .0
                .iter()
                .map(|v| RawRecord::new("fixed", v.as_object().unwrap().clone()))
                .collect())
        }
    }

    fn session() -> SearchSession {
        let source = FixedSource(vec![
            serde_json::json!({
                "name": "Rust developer",
                "alternate_url": "https://hh.ru/vacancy/1",
                "salary": {"from": 200000, "currency": "RUR"},
                "published_at": "2023-11-01T10:00:00+0300"
            }),
            serde_json::json!({
                "profession": "Senior Rust developer",
                "link": "https://superjob.ru/2",
                "payment_from": 3000,
                "currency": "usd",
                "date_published": 1700000000
            }),
        ]);
        let normalizer = Normalizer::new(
            Arc::new(StaticRates::from_pairs(&[("USD", 90.0)])),
            vec!["RUB".to_string(), "RUR".to_string()],
        );
        SearchSession::new(vec![Arc::new(source)], normalizer, 2, SearchMode::Reset)
    }

    async fn run_with(input: &str, stores: Vec<Box<dyn PostingStore>>) -> (String, SearchSession) {
        let mut app = JobSearchApp::new(session(), stores, Cursor::new(input.to_string()), Vec::new());
        app.run().await.unwrap();
        let JobSearchApp { session, output, .. } = app;
        (String::from_utf8(output).unwrap(), session)
    }

    #[tokio::test]
    async fn test_search_sort_by_salary_and_exit() {
        let (output, session) = run_with("1\nrust\n1\n2\n4\n", vec![]).await;

        assert!(output.contains("Found 2 vacancies."));
        assert_eq!(session.postings().len(), 1);
        assert_eq!(session.postings()[0].title, "Senior Rust developer");
        assert_eq!(session.postings()[0].salary, 270000);
        assert!(output.contains("Vacancy: Senior Rust developer"));
    }

    #[tokio::test]
    async fn test_invalid_inputs_reprompt() {
        let (output, session) = run_with("9\n1\nrust\nmany\n5\n3\n1\n4\n", vec![]).await;

        assert_eq!(output.matches("Invalid choice. Try again.").count(), 2);
        assert!(output.contains("Please enter a whole number."));
        assert!(output.contains("Unfortunately only 2 vacancies were found."));
        assert_eq!(session.postings()[0].date, "2023.11.14");
    }

    #[tokio::test]
    async fn test_display_and_save_without_results() {
        let (output, _) = run_with("2\n3\n4\n", vec![]).await;
        assert!(output.contains("No vacancies available."));
        assert!(output.contains("No vacancies match the search criteria."));
    }

    #[tokio::test]
    async fn test_save_writes_both_formats() {
        let dir = TempDir::new().unwrap();
        let csv = CsvPostingStore::new(dir.path().join("vacancies.csv"));
        let json = JsonLinesPostingStore::new(dir.path().join("vacancies.jsonl"));
        let stores: Vec<Box<dyn PostingStore>> = vec![Box::new(csv.clone()), Box::new(json.clone())];

        let (output, _) = run_with("1\ndeveloper\n2\n1\n3\n4\n", stores).await;

        assert!(output.contains("Saved 2 vacancies to files."));
        assert_eq!(csv.query_postings(&Criteria::new()).unwrap().len(), 2);
        assert_eq!(json.query_postings(&Criteria::new()).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let (output, _) = run_with("1\n", vec![]).await;
        assert!(output.ends_with("Enter a job title to search: "));
    }
}
