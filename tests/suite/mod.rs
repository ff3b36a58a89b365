mod cli;
mod html_import;
mod text_import;
