//! Meeting-report understanding: parse, identify the client, extract tasks.

use super::AgentError;
use crate::domain::reports::{ClientIdentification, ParsedReport, TaskItem};
use crate::llm::{decode, extract_as, extract_json, Extracted, GenerateOptions, LlmError, TextGenerator};
use crate::utils::text::truncate_chars;
use serde_json::Value;

/// Characters of the report shown to the client identifier.
const IDENTIFY_CONTEXT_CHARS: usize = 3000;

const PARSE_SYSTEM: &str = r#"You are an expert meeting analyst. Your job is to parse meeting summary reports and extract structured data.

You must return ONLY valid JSON with no extra text. The JSON must have this exact structure:
{
    "title": "Meeting title or subject",
    "date": "YYYY-MM-DD format if found, otherwise empty string",
    "attendees": ["List", "of", "attendee", "names"],
    "client_name": "The external client/company name (not your own company). If unclear, use the most prominent external name.",
    "summary": "A concise 2-3 paragraph summary of the meeting",
    "key_topics": ["Topic 1 discussed", "Topic 2 discussed"],
    "action_items": [
        {
            "task": "Description of the task or action item",
            "assignee": "Person responsible (full name if available)",
            "priority": "High/Medium/Low",
            "category": "Task/Follow-up/Decision/Action Item"
        }
    ],
    "transcript_highlights": ["Notable quote or key statement"]
}

Rules for client identification:
- The client is typically the external party, not the host organization
- Look for company names and project names tied to external parties
- If the meeting is between two external parties, identify the one being served
- Never return an empty client_name; make your best determination

Rules for task extraction:
- Extract ALL action items, commitments and follow-ups mentioned
- Assign each task to the person who volunteered or was assigned it
- If no specific person was assigned, use "Unassigned"
- Infer priority from context (urgency words, deadlines mentioned)
- Categorize as Task, Follow-up, Decision or Action Item"#;

const IDENTIFY_SYSTEM: &str = r#"You are a client identification specialist. Given a meeting report and a list of known clients, determine which client this meeting is associated with.

Return ONLY valid JSON:
{
    "client_name": "The client name (normalized/cleaned)",
    "confidence": "high/medium/low",
    "is_new_client": true/false,
    "matched_existing": "Name of the matched existing client, or null if new",
    "reasoning": "Brief explanation of how you identified the client"
}

Rules:
- Match against known clients using fuzzy matching ("Acme" matches "Acme Corp" and "ACME Inc")
- If the client is clearly a known client, even with slight name variations, set is_new_client to false
- If no known client matches, set is_new_client to true
- The client_name should be the canonical, clean version of the name"#;

const TASKS_SYSTEM: &str = r#"You are a task extraction specialist. Extract ALL actionable tasks, commitments, follow-ups and decisions from meeting transcripts and summaries.

Return ONLY a valid JSON array:
[
    {
        "name": "Clear, actionable description of the task",
        "assignee": "Person responsible (from attendees list if possible)",
        "due_date": "YYYY-MM-DD if mentioned or inferable, otherwise empty string",
        "priority": "High/Medium/Low",
        "category": "Task/Follow-up/Decision/Action Item"
    }
]

Rules:
- Capture every commitment, promise or planned action
- Write task names as actionable statements that start with a verb
- Match assignees to the attendees list when possible
- If someone says "I'll do X", assign X to that person
- Infer priority: explicit urgency = High, standard items = Medium, nice-to-haves = Low
- If no tasks are found, return an empty array []"#;

pub struct ReportProcessor<'a> {
    llm: &'a dyn TextGenerator,
}

impl<'a> ReportProcessor<'a> {
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self { llm }
    }

    pub fn parse(&self, raw_report: &str) -> Result<ParsedReport, AgentError> {
        let user = format!(
            "Parse the following meeting summary report and extract all structured data.\n\n\
             --- REPORT START ---\n{raw_report}\n--- REPORT END ---\n\nReturn the structured JSON."
        );
        let text = self.llm.generate(PARSE_SYSTEM, &user, GenerateOptions::new(4096, 0.2))?;
        Ok(extract_as(&text)?)
    }

    /// Match the report against known client names. An unreadable answer
    /// yields the default identification (no name, new client).
    pub fn identify_client(
        &self,
        raw_report: &str,
        known_clients: &[String],
    ) -> Result<ClientIdentification, LlmError> {
        let known = serde_json::to_string(known_clients).unwrap_or_else(|_| "[]".to_string());
        let user = format!(
            "Identify the client from this meeting report.\n\nKnown clients: {known}\n\n\
             --- MEETING REPORT ---\n{}\n--- END REPORT ---\n\nReturn the identification JSON.",
            truncate_chars(raw_report, IDENTIFY_CONTEXT_CHARS)
        );
        let text = self.llm.generate(IDENTIFY_SYSTEM, &user, GenerateOptions::new(1024, 0.1))?;
        Ok(extract_as(&text).unwrap_or_default())
    }

    /// Tasks arrive as a bare array or as `{"tasks": [...]}`; anything else
    /// counts as no tasks.
    pub fn extract_tasks(&self, raw_report: &str, attendees: &[String]) -> Result<Vec<TaskItem>, LlmError> {
        let attendees = if attendees.is_empty() { "Unknown".to_string() } else { attendees.join(", ") };
        let user = format!(
            "Extract all tasks from this meeting report.\n\nMeeting attendees: {attendees}\n\n\
             --- MEETING REPORT ---\n{raw_report}\n--- END REPORT ---\n\nReturn the tasks JSON array."
        );
        let text = self.llm.generate(TASKS_SYSTEM, &user, GenerateOptions::new(4096, 0.2))?;
        let list = match extract_json(&text) {
            Extracted::Parsed(Value::Array(items)) => items,
            Extracted::Parsed(Value::Object(mut map)) => match map.remove("tasks") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(list.into_iter().filter_map(|item| decode::<TaskItem>(item).ok()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;

    #[test]
    fn parse_reads_fenced_json() {
        let llm = ScriptedGenerator::new([
            "```json\n{\"title\": \"Kickoff\", \"client_name\": \"Acme\", \"action_items\": [\"Send deck\"]}\n```",
        ]);
        let report = ReportProcessor::new(&llm).parse("raw").expect("report");
        assert_eq!(report.title, "Kickoff");
        assert_eq!(report.client_name, "Acme");
        assert_eq!(report.action_items[0].text(), "Send deck");

        let request = &llm.requests.lock().expect("lock")[0];
        assert_eq!(request.options, GenerateOptions::new(4096, 0.2));
    }

    #[test]
    fn parse_failure_carries_raw_text() {
        let llm = ScriptedGenerator::new(["no json here"]);
        let err = ReportProcessor::new(&llm).parse("raw").unwrap_err();
        match err {
            AgentError::Unparsable(e) => assert_eq!(e.raw, "no json here"),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn identify_truncates_report_and_lists_known_clients() {
        let llm = ScriptedGenerator::new([r#"{"client_name": "Acme Corp", "is_new_client": false}"#]);
        let report = "x".repeat(5000);
        let id = ReportProcessor::new(&llm)
            .identify_client(&report, &["Acme Corp".to_string()])
            .expect("id");
        assert_eq!(id.client_name.as_deref(), Some("Acme Corp"));
        assert!(!id.is_new_client);

        let prompt = llm.last_user_text();
        assert!(prompt.contains(r#"Known clients: ["Acme Corp"]"#));
        assert!(prompt.contains(&"x".repeat(3000)));
        assert!(!prompt.contains(&"x".repeat(3001)));
    }

    #[test]
    fn tasks_accept_array_or_wrapped_object() {
        let llm = ScriptedGenerator::new([
            r#"[{"name": "Email client", "priority": "High"}]"#,
            r#"{"tasks": [{"task": "Draft SOW"}]}"#,
            "nothing",
        ]);
        let processor = ReportProcessor::new(&llm);
        let tasks = processor.extract_tasks("r", &[]).expect("tasks");
        assert_eq!(tasks[0].name, "Email client");
        assert!(llm.last_user_text().contains("Meeting attendees: Unknown"));

        let tasks = processor.extract_tasks("r", &["Ana".into(), "Bo".into()]).expect("tasks");
        assert_eq!(tasks[0].name, "Draft SOW");
        assert!(llm.last_user_text().contains("Meeting attendees: Ana, Bo"));

        assert!(processor.extract_tasks("r", &[]).expect("tasks").is_empty());
    }
}
