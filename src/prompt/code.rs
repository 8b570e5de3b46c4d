//! Instructions for the code-generation agent

/// Answer given when no code can answer the question
pub const FALLBACK_ANSWER: &str = "I don't know";

/// Language tag of the fenced block the agent must return
const CODE_FENCE_LANG: &str = "python";

/// System instructions for the code agent
pub const CODE_AGENT_INSTRUCTIONS: &str = r#"You are an agent designed to write python code to answer questions.
You have access to a python REPL, which you can use to execute python code.
If you get an error, debug your code and try again.
You might know the answer without running any code, but you should still run the code to get the answer.
If it does not seem like you can write code to answer the question, just return "I don't know" as the answer.
Always output the python code only.
Generate the code <code> for plotting the previous data in plotly, in the format requested.
The solution should be given using plotly and only plotly. Do not use matplotlib.
Return the code <code> in the following format ```python <code>```"#;

/// Pull the body of the first ```python fenced block out of an answer
pub fn extract_code_block(answer: &str) -> Option<&str> {
    let fence = format!("```{}", CODE_FENCE_LANG);
    let start = answer.find(&fence)? + fence.len();
    let rest = &answer[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_pin_the_output_contract() {
        assert!(CODE_AGENT_INSTRUCTIONS.contains("plotly and only plotly"));
        assert!(CODE_AGENT_INSTRUCTIONS.contains("Do not use matplotlib"));
        assert!(CODE_AGENT_INSTRUCTIONS.contains(FALLBACK_ANSWER));
        assert!(CODE_AGENT_INSTRUCTIONS.contains("```python <code>```"));
    }

    #[test]
    fn test_extract_code_block() {
        let answer = "```python\nimport plotly.express as px\nfig = px.bar(x=[1], y=[2])\n```";
        assert_eq!(
            extract_code_block(answer),
            Some("import plotly.express as px\nfig = px.bar(x=[1], y=[2])")
        );
        assert_eq!(extract_code_block(FALLBACK_ANSWER), None);
    }
}
