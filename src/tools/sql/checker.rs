//! sql_db_query_checker: have the model proofread a query

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::llm::LlmProvider;
use crate::prompt::PromptTemplate;
use crate::tools::tool::{text_input, Tool, ToolResult};

const QUERY_CHECKER: &str = r#"{query}
Double check the {dialect} query above for common mistakes, including:
- Using NOT IN with NULL values
- Using UNION when UNION ALL should have been used
- Using BETWEEN for exclusive ranges
- Data type mismatch in predicates
- Properly quoting identifiers
- Using the correct number of arguments for functions
- Casting to the correct data type
- Using the proper columns for joins

If there are any of the above mistakes, rewrite the query. If there are no mistakes, just reproduce the original query.

Output the final SQL query only.

SQL Query: "#;

/// Tool that asks the model to double check a query before it runs
pub struct QueryCheckerTool {
    llm: Arc<dyn LlmProvider>,
    template: PromptTemplate,
}

impl QueryCheckerTool {
    pub fn new(llm: Arc<dyn LlmProvider>, dialect: &str) -> Result<Self> {
        let template = PromptTemplate::new(QUERY_CHECKER)?.partial("dialect", dialect)?;
        template.require_slots(&["query"])?;
        Ok(Self { llm, template })
    }
}

#[async_trait]
impl Tool for QueryCheckerTool {
    fn name(&self) -> &str {
        "sql_db_query_checker"
    }

    fn description(&self) -> &str {
        "Use this tool to double check if your query is correct before executing it. \
         Always use this tool before executing a query with sql_db_query!"
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let query = text_input(input, self.input_field())?;
        let prompt = self.template.format(&[("query", query.as_str())])?;

        match self.llm.send_message(&prompt, &[], None).await {
            Ok(checked) => Ok(ToolResult::success(checked.trim())),
            Err(e) => Ok(ToolResult::error(format!("Error: {:#}", e))),
        }
    }
}
