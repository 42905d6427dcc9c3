//! Tool execution: typed argument decoding and the exhaustive tool match.
//!
//! Each tool declares its own argument struct; decoding failures surface as
//! validation errors naming the tool. The single match below is the only
//! place a tool is wired to its handler, checked for coverage at compile
//! time.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use super::tools::Tool;
use crate::confluence::{ConfluenceApi, UploadFile};
use crate::content::{ContentEngine, EmbedOptions, Position, RemoteFiles, UploadSource};
use crate::error::GatewayError;

/// Request-scoped values the dispatcher needs besides the arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchContext<'a> {
  /// Tenant default space key applied when a tool call omits one.
  pub default_space_key: Option<&'a str>,
  /// Issue-tracker base URL for Jira link operations.
  pub issue_tracker_base_url: Option<&'a str>,
}

/// Inline file payload accepted by the upload tools.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileArg {
  /// Filename under which the attachment is stored.
  pub name: String,
  /// Base64-encoded file content.
  pub data: String,
  /// MIME type of the content.
  pub mime_type: String,
}

impl FileArg {
  fn decode(self) -> Result<UploadFile, GatewayError> {
    use base64::Engine as _;
    let data = base64::engine::general_purpose::STANDARD
      .decode(self.data.as_bytes())
      .map_err(|e| GatewayError::Validation(format!("file data is not valid base64: {e}")))?;
    Ok(UploadFile {
      name: self.name,
      mime_type: self.mime_type,
      data,
    })
  }
}

#[derive(Deserialize)]
struct GetSpacesArgs {
  #[serde(default)]
  params: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpaceArgs {
  space_key: Option<String>,
}

#[derive(Deserialize)]
struct GetContentByIdArgs {
  id: String,
  #[serde(default)]
  expand: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindContentArgs {
  space_key: Option<String>,
  title: String,
}

#[derive(Deserialize)]
struct SearchArgs {
  cql: String,
  limit: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePageArgs {
  space_key: Option<String>,
  title: String,
  content: String,
  parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePageArgs {
  page_id: String,
  title: String,
  content: String,
  version: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageArgs {
  page_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddLabelsArgs {
  page_id: String,
  labels: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadDocumentArgs {
  page_id: String,
  file: FileArg,
  comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDocumentArgs {
  page_id: String,
  attachment_id: String,
  file: FileArg,
  comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteDocumentArgs {
  attachment_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsArgs {
  space_key: Option<String>,
  #[serde(rename = "type")]
  content_type: Option<String>,
  limit: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderArgs {
  space_key: Option<String>,
  title: String,
  parent_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderContentsArgs {
  page_id: String,
  #[serde(default)]
  expand: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovePageArgs {
  page_id: String,
  new_parent_id: String,
  current_version: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTemplateArgs {
  space_key: Option<String>,
  name: String,
  content: String,
  description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplyTemplateArgs {
  template_id: String,
  space_key: Option<String>,
  title: String,
  parent_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTemplateArgs {
  template_id: String,
  name: String,
  content: String,
  version: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PagesByLabelArgs {
  space_key: Option<String>,
  label: String,
  limit: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageHistoryArgs {
  page_id: String,
  limit: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertMacroArgs {
  page_id: String,
  macro_name: String,
  #[serde(default)]
  parameters: Option<Map<String, Value>>,
  body: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateMacroArgs {
  page_id: String,
  old_macro_name: String,
  new_macro_name: String,
  #[serde(default)]
  parameters: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkIssueArgs {
  page_id: String,
  issue_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraMacroArgs {
  page_id: String,
  jql_query: String,
  #[serde(default)]
  display_options: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbedAttachmentArgs {
  page_id: String,
  attachment_id: String,
  attachment_name: String,
  width: Option<u32>,
  position: Option<Position>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadAndEmbedArgs {
  page_id: String,
  file: Option<FileArg>,
  file_url: Option<String>,
  filename: Option<String>,
  comment: Option<String>,
  width: Option<u32>,
  position: Option<Position>,
}

impl UploadAndEmbedArgs {
  fn into_source_and_options(self) -> Result<(String, UploadSource, EmbedOptions), GatewayError> {
    let source = match (self.file, self.file_url) {
      (Some(file), _) => UploadSource::Inline {
        name: file.name,
        data: file.data,
        mime_type: file.mime_type,
      },
      (None, Some(url)) => UploadSource::Url {
        url,
        filename: self.filename,
      },
      (None, None) => {
        return Err(GatewayError::Validation(String::from(
          "either file or fileUrl must be provided",
        )));
      }
    };

    let options = EmbedOptions {
      comment: self.comment,
      width: self.width,
      position: self.position,
    };
    Ok((self.page_id, source, options))
  }
}

/// Decode a tool's arguments, treating an absent object as empty.
fn parse_args<T: serde::de::DeserializeOwned>(tool: Tool, arguments: Value) -> Result<T, GatewayError> {
  let arguments = if arguments.is_null() { json!({}) } else { arguments };
  serde_json::from_value(arguments)
    .map_err(|e| GatewayError::Validation(format!("invalid arguments for {}: {e}", tool.name())))
}

/// Apply the space-key convenience rule: explicit argument, else tenant
/// default, else a validation failure naming the requirement.
fn require_space_key(provided: Option<String>, ctx: &DispatchContext<'_>) -> Result<String, GatewayError> {
  provided
    .filter(|key| !key.is_empty())
    .or_else(|| ctx.default_space_key.map(str::to_string))
    .ok_or_else(|| {
      GatewayError::Validation(String::from(
        "spaceKey required: provide in arguments or configure in project registry",
      ))
    })
}

fn require_tracker_url<'a>(ctx: &DispatchContext<'a>) -> Result<&'a str, GatewayError> {
  ctx.issue_tracker_base_url.ok_or_else(|| {
    GatewayError::Configuration(String::from(
      "issue tracker base URL not configured: set it in the project registry or gateway options",
    ))
  })
}

fn result_value<T: serde::Serialize>(value: T) -> Result<Value, GatewayError> {
  serde_json::to_value(value).map_err(|e| GatewayError::Backend {
    status: None,
    message: format!("failed to serialize result: {e}"),
  })
}

/// Execute one tool call against the tenant's engine.
pub async fn execute_tool<A: ConfluenceApi, R: RemoteFiles>(
  tool: Tool,
  arguments: Value,
  engine: &ContentEngine<A, R>,
  ctx: &DispatchContext<'_>,
) -> Result<Value, GatewayError> {
  info!(tool = tool.name(), "executing tool");
  let api = engine.api();

  match tool {
    Tool::GetSpaces => {
      let args: GetSpacesArgs = parse_args(tool, arguments)?;
      api.get_spaces(&args.params.unwrap_or_default()).await
    }
    Tool::GetSpace => {
      let args: SpaceArgs = parse_args(tool, arguments)?;
      api.get_space(&require_space_key(args.space_key, ctx)?).await
    }
    Tool::GetSpacePermissions => {
      let args: SpaceArgs = parse_args(tool, arguments)?;
      api.get_space_permissions(&require_space_key(args.space_key, ctx)?).await
    }
    Tool::GetContentById => {
      let args: GetContentByIdArgs = parse_args(tool, arguments)?;
      let expand = args.expand.unwrap_or_default();
      let expand_refs: Vec<&str> = expand.iter().map(String::as_str).collect();
      result_value(api.get_content_by_id(&args.id, &expand_refs).await?)
    }
    Tool::GetContentBySpaceAndTitle => {
      let args: FindContentArgs = parse_args(tool, arguments)?;
      api.find_content(&require_space_key(args.space_key, ctx)?, &args.title).await
    }
    Tool::Search => {
      let args: SearchArgs = parse_args(tool, arguments)?;
      api.search(&args.cql, args.limit.unwrap_or(10)).await
    }
    Tool::CreatePage => {
      let args: CreatePageArgs = parse_args(tool, arguments)?;
      let space_key = require_space_key(args.space_key, ctx)?;
      result_value(
        api
          .create_page(&space_key, &args.title, &args.content, args.parent_id.as_deref())
          .await?,
      )
    }
    Tool::UpdatePage => {
      let args: UpdatePageArgs = parse_args(tool, arguments)?;
      result_value(
        api
          .update_page(&args.page_id, &args.title, &args.content, args.version)
          .await?,
      )
    }
    Tool::GetPageAttachments => {
      let args: PageArgs = parse_args(tool, arguments)?;
      api.get_page_attachments(&args.page_id).await
    }
    Tool::GetPageChildren => {
      let args: PageArgs = parse_args(tool, arguments)?;
      api.get_page_children(&args.page_id, &[], None).await
    }
    Tool::AddPageLabels => {
      let args: AddLabelsArgs = parse_args(tool, arguments)?;
      api.add_page_labels(&args.page_id, &args.labels).await
    }
    Tool::UploadDocument => {
      let args: UploadDocumentArgs = parse_args(tool, arguments)?;
      let file = args.file.decode()?;
      result_value(api.upload_attachment(&args.page_id, &file, args.comment.as_deref()).await?)
    }
    Tool::UpdateDocument => {
      let args: UpdateDocumentArgs = parse_args(tool, arguments)?;
      let file = args.file.decode()?;
      api
        .update_attachment(&args.page_id, &args.attachment_id, &file, args.comment.as_deref())
        .await
    }
    Tool::DeleteDocument => {
      let args: DeleteDocumentArgs = parse_args(tool, arguments)?;
      api.delete_attachment(&args.attachment_id).await
    }
    Tool::ListDocuments => {
      let args: ListDocumentsArgs = parse_args(tool, arguments)?;
      let space_key = require_space_key(args.space_key, ctx)?;
      api
        .list_content(
          &space_key,
          args.content_type.as_deref().unwrap_or("attachment"),
          args.limit.unwrap_or(25),
        )
        .await
    }
    Tool::CreateFolder => {
      let args: CreateFolderArgs = parse_args(tool, arguments)?;
      let space_key = require_space_key(args.space_key, ctx)?;
      result_value(
        engine
          .create_folder(&space_key, &args.title, args.parent_id.as_deref())
          .await?,
      )
    }
    Tool::GetFolderContents => {
      let args: FolderContentsArgs = parse_args(tool, arguments)?;
      engine.get_folder_contents(&args.page_id, args.expand).await
    }
    Tool::MovePageToFolder => {
      let args: MovePageArgs = parse_args(tool, arguments)?;
      result_value(
        engine
          .move_page_to_folder(&args.page_id, &args.new_parent_id, args.current_version)
          .await?,
      )
    }
    Tool::CreatePageTemplate => {
      let args: CreateTemplateArgs = parse_args(tool, arguments)?;
      let space_key = require_space_key(args.space_key, ctx)?;
      engine
        .create_page_template(&space_key, &args.name, &args.content, args.description.as_deref())
        .await
    }
    Tool::GetPageTemplates => {
      let args: SpaceArgs = parse_args(tool, arguments)?;
      engine.get_page_templates(&require_space_key(args.space_key, ctx)?).await
    }
    Tool::ApplyPageTemplate => {
      let args: ApplyTemplateArgs = parse_args(tool, arguments)?;
      let space_key = require_space_key(args.space_key, ctx)?;
      result_value(
        engine
          .apply_page_template(&args.template_id, &space_key, &args.title, args.parent_id.as_deref())
          .await?,
      )
    }
    Tool::UpdatePageTemplate => {
      let args: UpdateTemplateArgs = parse_args(tool, arguments)?;
      result_value(
        engine
          .update_page_template(&args.template_id, &args.name, &args.content, args.version)
          .await?,
      )
    }
    Tool::GetPagesByLabel => {
      let args: PagesByLabelArgs = parse_args(tool, arguments)?;
      let space_key = require_space_key(args.space_key, ctx)?;
      engine
        .get_pages_by_label(&space_key, &args.label, args.limit.unwrap_or(25))
        .await
    }
    Tool::GetPageHistory => {
      let args: PageHistoryArgs = parse_args(tool, arguments)?;
      api.get_page_history(&args.page_id, args.limit.unwrap_or(10)).await
    }
    Tool::InsertMacro => {
      let args: InsertMacroArgs = parse_args(tool, arguments)?;
      result_value(
        engine
          .insert_macro(
            &args.page_id,
            &args.macro_name,
            &args.parameters.unwrap_or_default(),
            args.body.as_deref(),
          )
          .await?,
      )
    }
    Tool::UpdateMacro => {
      let args: UpdateMacroArgs = parse_args(tool, arguments)?;
      result_value(
        engine
          .update_macro(
            &args.page_id,
            &args.old_macro_name,
            &args.new_macro_name,
            &args.parameters.unwrap_or_default(),
          )
          .await?,
      )
    }
    Tool::GetPageMacros => {
      let args: PageArgs = parse_args(tool, arguments)?;
      engine.get_page_macros(&args.page_id).await
    }
    Tool::LinkPageToJiraIssue => {
      let args: LinkIssueArgs = parse_args(tool, arguments)?;
      let tracker = require_tracker_url(ctx)?;
      result_value(engine.link_page_to_issue(&args.page_id, &args.issue_key, tracker).await?)
    }
    Tool::InsertJiraMacro => {
      let args: JiraMacroArgs = parse_args(tool, arguments)?;
      result_value(
        engine
          .insert_jira_macro(&args.page_id, &args.jql_query, &args.display_options.unwrap_or_default())
          .await?,
      )
    }
    Tool::EmbedExistingAttachment => {
      let args: EmbedAttachmentArgs = parse_args(tool, arguments)?;
      result_value(
        engine
          .embed_existing_attachment(
            &args.page_id,
            &args.attachment_id,
            &args.attachment_name,
            args.width.unwrap_or(crate::content::engine::DEFAULT_IMAGE_WIDTH),
            args.position.unwrap_or(Position::Inline),
          )
          .await?,
      )
    }
    Tool::UploadAndEmbedDocument | Tool::UploadAndEmbedAttachment => {
      let args: UploadAndEmbedArgs = parse_args(tool, arguments)?;
      let (page_id, source, options) = args.into_source_and_options()?;
      engine.upload_and_embed(&page_id, source, options).await
    }
  }
}
