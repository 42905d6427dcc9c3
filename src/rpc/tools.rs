//! The closed registry of callable tools.
//!
//! Tool names form a fixed set; dispatch happens over an exhaustive match
//! on this enum, so adding a tool without wiring its handler is a compile
//! error rather than a runtime fallthrough.

use serde_json::{Value, json};

/// Every operation callable through `tools/call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
  GetSpaces,
  GetSpace,
  GetContentById,
  GetContentBySpaceAndTitle,
  Search,
  CreatePage,
  UpdatePage,
  GetPageAttachments,
  GetPageChildren,
  AddPageLabels,
  UploadDocument,
  UpdateDocument,
  DeleteDocument,
  ListDocuments,
  CreateFolder,
  GetFolderContents,
  MovePageToFolder,
  CreatePageTemplate,
  GetPageTemplates,
  ApplyPageTemplate,
  UpdatePageTemplate,
  GetPagesByLabel,
  GetPageHistory,
  InsertMacro,
  UpdateMacro,
  GetPageMacros,
  LinkPageToJiraIssue,
  InsertJiraMacro,
  GetSpacePermissions,
  EmbedExistingAttachment,
  UploadAndEmbedDocument,
  UploadAndEmbedAttachment,
}

impl Tool {
  /// Every tool, in the order advertised by `tools/list`.
  pub const ALL: [Self; 32] = [
    Self::GetSpaces,
    Self::GetSpace,
    Self::GetContentById,
    Self::GetContentBySpaceAndTitle,
    Self::Search,
    Self::CreatePage,
    Self::UpdatePage,
    Self::GetPageAttachments,
    Self::GetPageChildren,
    Self::AddPageLabels,
    Self::UploadDocument,
    Self::UpdateDocument,
    Self::DeleteDocument,
    Self::ListDocuments,
    Self::CreateFolder,
    Self::GetFolderContents,
    Self::MovePageToFolder,
    Self::CreatePageTemplate,
    Self::GetPageTemplates,
    Self::ApplyPageTemplate,
    Self::UpdatePageTemplate,
    Self::GetPagesByLabel,
    Self::GetPageHistory,
    Self::InsertMacro,
    Self::UpdateMacro,
    Self::GetPageMacros,
    Self::LinkPageToJiraIssue,
    Self::InsertJiraMacro,
    Self::GetSpacePermissions,
    Self::EmbedExistingAttachment,
    Self::UploadAndEmbedDocument,
    Self::UploadAndEmbedAttachment,
  ];

  /// The wire name of this tool.
  pub fn name(self) -> &'static str {
    match self {
      Self::GetSpaces => "get_spaces",
      Self::GetSpace => "get_space",
      Self::GetContentById => "get_content_by_id",
      Self::GetContentBySpaceAndTitle => "get_content_by_space_and_title",
      Self::Search => "search",
      Self::CreatePage => "create_page",
      Self::UpdatePage => "update_page",
      Self::GetPageAttachments => "get_page_attachments",
      Self::GetPageChildren => "get_page_children",
      Self::AddPageLabels => "add_page_labels",
      Self::UploadDocument => "upload_document",
      Self::UpdateDocument => "update_document",
      Self::DeleteDocument => "delete_document",
      Self::ListDocuments => "list_documents",
      Self::CreateFolder => "create_folder",
      Self::GetFolderContents => "get_folder_contents",
      Self::MovePageToFolder => "move_page_to_folder",
      Self::CreatePageTemplate => "create_page_template",
      Self::GetPageTemplates => "get_page_templates",
      Self::ApplyPageTemplate => "apply_page_template",
      Self::UpdatePageTemplate => "update_page_template",
      Self::GetPagesByLabel => "get_pages_by_label",
      Self::GetPageHistory => "get_page_history",
      Self::InsertMacro => "insert_macro",
      Self::UpdateMacro => "update_macro",
      Self::GetPageMacros => "get_page_macros",
      Self::LinkPageToJiraIssue => "link_page_to_jira_issue",
      Self::InsertJiraMacro => "insert_jira_macro",
      Self::GetSpacePermissions => "get_space_permissions",
      Self::EmbedExistingAttachment => "embed_existing_attachment",
      Self::UploadAndEmbedDocument => "upload_and_embed_document",
      Self::UploadAndEmbedAttachment => "upload_and_embed_attachment",
    }
  }

  /// Resolve a wire name to a tool, or `None` for names outside the
  /// registry.
  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|tool| tool.name() == name)
  }

  /// One-line human-readable description.
  pub fn description(self) -> &'static str {
    match self {
      Self::GetSpaces => "List all Confluence spaces",
      Self::GetSpace => "Get details of a specific space",
      Self::GetContentById => "Retrieve page by ID",
      Self::GetContentBySpaceAndTitle => "Find page by space and title",
      Self::Search => "Search using CQL (Confluence Query Language)",
      Self::CreatePage => "Create a new Confluence page",
      Self::UpdatePage => "Update existing page content",
      Self::GetPageAttachments => "List page attachments",
      Self::GetPageChildren => "Get child pages",
      Self::AddPageLabels => "Add labels to a page",
      Self::UploadDocument => "Upload file to page",
      Self::UpdateDocument => "Update existing attachment",
      Self::DeleteDocument => "Remove attachment",
      Self::ListDocuments => "List documents in space",
      Self::CreateFolder => "Create folder (parent page)",
      Self::GetFolderContents => "List folder contents",
      Self::MovePageToFolder => "Move page to different parent",
      Self::CreatePageTemplate => "Create reusable template",
      Self::GetPageTemplates => "List space templates",
      Self::ApplyPageTemplate => "Create page from template",
      Self::UpdatePageTemplate => "Modify template",
      Self::GetPagesByLabel => "Find pages with a specific label",
      Self::GetPageHistory => "View page version history",
      Self::InsertMacro => "Add macro to page",
      Self::UpdateMacro => "Modify existing macro",
      Self::GetPageMacros => "List page macros",
      Self::LinkPageToJiraIssue => "Link page to a Jira issue",
      Self::InsertJiraMacro => "Embed Jira issues via JQL",
      Self::GetSpacePermissions => "View space permissions",
      Self::EmbedExistingAttachment => "Embed attachment in page",
      Self::UploadAndEmbedDocument => "Upload and embed in one step",
      Self::UploadAndEmbedAttachment => "Upload and embed attachment",
    }
  }

  /// JSON Schema describing this tool's `arguments` object.
  pub fn input_schema(self) -> Value {
    match self {
      Self::GetSpaces => schema(
        json!({ "params": { "type": "object", "description": "Query parameters such as limit and start" } }),
        &[],
      ),
      Self::GetSpace | Self::GetSpacePermissions | Self::GetPageTemplates => schema(
        json!({ "spaceKey": space_key_property() }),
        &[],
      ),
      Self::GetContentById => schema(
        json!({
          "id": { "type": "string", "description": "Content ID" },
          "expand": { "type": "array", "items": { "type": "string" }, "description": "Response expansions" },
        }),
        &["id"],
      ),
      Self::GetContentBySpaceAndTitle => schema(
        json!({
          "spaceKey": space_key_property(),
          "title": { "type": "string", "description": "Exact page title" },
        }),
        &["title"],
      ),
      Self::Search => schema(
        json!({
          "cql": { "type": "string", "description": "CQL query" },
          "limit": { "type": "integer", "description": "Maximum results (default 10)" },
        }),
        &["cql"],
      ),
      Self::CreatePage => schema(
        json!({
          "spaceKey": space_key_property(),
          "title": { "type": "string", "description": "Page title" },
          "content": { "type": "string", "description": "Body in storage format" },
          "parentId": { "type": "string", "description": "Optional parent page ID" },
        }),
        &["title", "content"],
      ),
      Self::UpdatePage => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "title": { "type": "string", "description": "New title" },
          "content": { "type": "string", "description": "New body in storage format" },
          "version": { "type": "integer", "description": "Version last observed by the caller" },
        }),
        &["pageId", "title", "content", "version"],
      ),
      Self::GetPageAttachments | Self::GetPageChildren | Self::GetPageMacros => schema(
        json!({ "pageId": { "type": "string", "description": "Page ID" } }),
        &["pageId"],
      ),
      Self::AddPageLabels => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "labels": { "type": "array", "items": { "type": "string" }, "description": "Label names" },
        }),
        &["pageId", "labels"],
      ),
      Self::UploadDocument => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "file": file_property(),
          "comment": { "type": "string", "description": "Optional upload comment" },
        }),
        &["pageId", "file"],
      ),
      Self::UpdateDocument => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "attachmentId": { "type": "string", "description": "Attachment ID" },
          "file": file_property(),
          "comment": { "type": "string", "description": "Optional upload comment" },
        }),
        &["pageId", "attachmentId", "file"],
      ),
      Self::DeleteDocument => schema(
        json!({ "attachmentId": { "type": "string", "description": "Attachment ID" } }),
        &["attachmentId"],
      ),
      Self::ListDocuments => schema(
        json!({
          "spaceKey": space_key_property(),
          "type": { "type": "string", "description": "Content type (default attachment)" },
          "limit": { "type": "integer", "description": "Maximum results (default 25)" },
        }),
        &[],
      ),
      Self::CreateFolder => schema(
        json!({
          "spaceKey": space_key_property(),
          "title": { "type": "string", "description": "Folder title" },
          "parentId": { "type": "string", "description": "Optional parent page ID" },
        }),
        &["title"],
      ),
      Self::GetFolderContents => schema(
        json!({
          "pageId": { "type": "string", "description": "Folder page ID" },
          "expand": { "type": "array", "items": { "type": "string" }, "description": "Response expansions" },
        }),
        &["pageId"],
      ),
      Self::MovePageToFolder => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID to move" },
          "newParentId": { "type": "string", "description": "Destination folder page ID" },
          "currentVersion": { "type": "integer", "description": "Version last observed by the caller" },
        }),
        &["pageId", "newParentId", "currentVersion"],
      ),
      Self::CreatePageTemplate => schema(
        json!({
          "spaceKey": space_key_property(),
          "name": { "type": "string", "description": "Template name" },
          "content": { "type": "string", "description": "Template body in storage format" },
          "description": { "type": "string", "description": "Optional template description" },
        }),
        &["name", "content"],
      ),
      Self::ApplyPageTemplate => schema(
        json!({
          "templateId": { "type": "string", "description": "Template page ID" },
          "spaceKey": space_key_property(),
          "title": { "type": "string", "description": "Title for the new page" },
          "parentId": { "type": "string", "description": "Optional parent page ID" },
        }),
        &["templateId", "title"],
      ),
      Self::UpdatePageTemplate => schema(
        json!({
          "templateId": { "type": "string", "description": "Template page ID" },
          "name": { "type": "string", "description": "New template name" },
          "content": { "type": "string", "description": "New template body" },
          "version": { "type": "integer", "description": "Version last observed by the caller" },
        }),
        &["templateId", "name", "content", "version"],
      ),
      Self::GetPagesByLabel => schema(
        json!({
          "spaceKey": space_key_property(),
          "label": { "type": "string", "description": "Label name" },
          "limit": { "type": "integer", "description": "Maximum results (default 25)" },
        }),
        &["label"],
      ),
      Self::GetPageHistory => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "limit": { "type": "integer", "description": "Maximum entries (default 10)" },
        }),
        &["pageId"],
      ),
      Self::InsertMacro => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "macroName": { "type": "string", "description": "Macro name, e.g. info or toc" },
          "parameters": { "type": "object", "description": "Macro parameters as key/value pairs" },
          "body": { "type": "string", "description": "Optional rich-text body" },
        }),
        &["pageId", "macroName"],
      ),
      Self::UpdateMacro => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "oldMacroName": { "type": "string", "description": "Name of the macro to replace" },
          "newMacroName": { "type": "string", "description": "Name of the replacement macro" },
          "parameters": { "type": "object", "description": "Replacement macro parameters" },
        }),
        &["pageId", "oldMacroName", "newMacroName"],
      ),
      Self::LinkPageToJiraIssue => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "issueKey": { "type": "string", "description": "Issue key, e.g. PROJ-42" },
        }),
        &["pageId", "issueKey"],
      ),
      Self::InsertJiraMacro => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "jqlQuery": { "type": "string", "description": "JQL query selecting the issues" },
          "displayOptions": { "type": "object", "description": "Additional macro parameters" },
        }),
        &["pageId", "jqlQuery"],
      ),
      Self::EmbedExistingAttachment => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "attachmentId": { "type": "string", "description": "Attachment ID" },
          "attachmentName": { "type": "string", "description": "Attachment filename used for rendering" },
          "width": { "type": "integer", "description": "Display width in pixels (default 800)" },
          "position": position_property(),
        }),
        &["pageId", "attachmentId", "attachmentName"],
      ),
      Self::UploadAndEmbedDocument | Self::UploadAndEmbedAttachment => schema(
        json!({
          "pageId": { "type": "string", "description": "Page ID" },
          "file": file_property(),
          "fileUrl": { "type": "string", "description": "Remote URL to fetch instead of inline data" },
          "filename": { "type": "string", "description": "Filename override for URL sources" },
          "comment": { "type": "string", "description": "Optional upload comment" },
          "width": { "type": "integer", "description": "Display width in pixels (default 800)" },
          "position": position_property(),
        }),
        &["pageId"],
      ),
    }
  }

  /// Full tool definition as advertised by `tools/list`.
  pub fn definition(self) -> Value {
    json!({
      "name": self.name(),
      "description": self.description(),
      "inputSchema": self.input_schema(),
    })
  }
}

/// The complete registry payload for `tools/list`.
pub fn list_tools() -> Value {
  let tools: Vec<Value> = Tool::ALL.into_iter().map(Tool::definition).collect();
  json!({ "tools": tools })
}

fn schema(properties: Value, required: &[&str]) -> Value {
  json!({
    "type": "object",
    "properties": properties,
    "required": required,
  })
}

fn space_key_property() -> Value {
  json!({
    "type": "string",
    "description": "Space key; falls back to the project's default space when omitted",
  })
}

fn file_property() -> Value {
  json!({
    "type": "object",
    "description": "Inline file payload",
    "properties": {
      "name": { "type": "string", "description": "Filename" },
      "data": { "type": "string", "description": "Base64-encoded content" },
      "mimeType": { "type": "string", "description": "MIME type" },
    },
    "required": ["name", "data", "mimeType"],
  })
}

fn position_property() -> Value {
  json!({
    "type": "string",
    "enum": ["inline", "center", "left", "right"],
    "description": "Placement of the embedded image",
  })
}
