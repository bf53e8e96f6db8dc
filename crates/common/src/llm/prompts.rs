//! System prompts and message layout for external models

use super::PromptType;

pub const PDF_ANALYSIS_PROMPT: &str = "You are an AI assistant specialized in analyzing PDF documents and providing detailed responses.
Your role is to answer questions about the document content accurately and helpfully.
Always base your responses ONLY on the document content provided - do not include external information.
If the information isn't in the document, clearly state this limitation rather than making up an answer.
Structure your responses in a clear, well-organized format using paragraphs, bullet points, or numbered lists as appropriate.
When referencing specific information, include the page number in the format [Page X].
Your tone should be professional, conversational, and accessible to all users.
";

pub const SUMMARIZATION_PROMPT: &str = "Create a comprehensive summary of the following document.
Focus on capturing the main ideas, key points, arguments, and essential details.
Organize the summary in a logical flow that follows the document's structure.
Use clear language and concise phrasing while preserving the document's original meaning and context.
Include all important conclusions and recommendations from the document.
Maintain an objective tone throughout the summary.
";

pub const SIMPLIFICATION_PROMPT: &str = "Simplify the following text to make it more accessible and easier to understand.
Preserve the core meaning, main ideas, and essential details.
Use simpler vocabulary and shorter sentences.
Break down complex concepts into clearer explanations.
Remove unnecessary jargon or technical terms, or explain them when they must be included.
Organize the simplified text in a logical, easy-to-follow structure.
Use active voice where possible and concrete examples to illustrate abstract concepts.
";

pub const MINDMAP_PROMPT: &str = r#"Create a comprehensive mind map based on the following document content.
The mind map should be in JSON format with the following structure:
{
  "id": "root",
  "name": "Document Title",
  "children": [
    {
      "id": "topic1",
      "name": "Main Topic 1",
      "children": [
        {
          "id": "topic1-1",
          "name": "Subtopic 1.1"
        }
      ]
    }
  ]
}
Identify and organize the main topics, subtopics, and key points from the document.
Ensure the document title or central theme is the root node.
Include 4-8 main topics that represent the document's most important sections or themes.
Add relevant subtopics to each main topic to show hierarchical relationships.
Create a logical structure that makes the document's organization clear.
Use concise, descriptive phrases for each node (not full sentences).
Only include the most essential information in the mind map structure.
Output ONLY the JSON structure with no additional text or explanation.
"#;

/// System prompt for a capability
pub fn system_prompt(prompt_type: PromptType) -> &'static str {
    match prompt_type {
        PromptType::PdfAnalysis => PDF_ANALYSIS_PROMPT,
        PromptType::Summarization => SUMMARIZATION_PROMPT,
        PromptType::Simplification => SIMPLIFICATION_PROMPT,
        PromptType::Mindmap => MINDMAP_PROMPT,
    }
}

/// User turn: document context followed by the task
pub fn user_message(query: &str, context: &str) -> String {
    if context.trim().is_empty() {
        format!("Task: {}", query)
    } else {
        format!("Document content:\n\n{}\n\nTask: {}", context, query)
    }
}

/// Single prompt string for completion-style endpoints
pub fn completion_prompt(prompt_type: PromptType, query: &str, context: &str) -> String {
    format!("{}\n\n{}", system_prompt(prompt_type), user_message(query, context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_layout() {
        assert_eq!(
            user_message("Summarize", "Some text"),
            "Document content:\n\nSome text\n\nTask: Summarize"
        );
        assert_eq!(user_message("Hello", "  "), "Task: Hello");
    }

    #[test]
    fn test_mindmap_prompt_requests_json() {
        let prompt = system_prompt(PromptType::Mindmap);
        assert!(prompt.contains("\"id\": \"root\""));
        assert!(prompt.contains("Output ONLY the JSON"));
    }

    #[test]
    fn test_completion_prompt_starts_with_system_prompt() {
        let prompt = completion_prompt(PromptType::Summarization, "Summarize", "Body");
        assert!(prompt.starts_with(SUMMARIZATION_PROMPT));
        assert!(prompt.ends_with("Task: Summarize"));
    }
}
