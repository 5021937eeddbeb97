use std::{io::Cursor, path::PathBuf, sync::Arc};

use axum::{
    body::Bytes,
    debug_handler,
    extract::{Multipart, State},
    Json,
};
use image::{DynamicImage, ImageFormat, ImageReader};
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    config::Config,
    db::{users, Store},
    AppError, AppResult, AppState, FieldErrors,
};

use super::UserView;

const FIELD: &str = "profile_picture";

const ACCEPTED: [(&str, ImageFormat, &str); 2] = [
    ("image/jpeg", ImageFormat::Jpeg, "jpg"),
    ("image/png", ImageFormat::Png, "png"),
];

/// Replaces the caller's avatar. The stored image is center-cropped to a square.
#[debug_handler(state = AppState)]
pub(crate) async fn upload_profile_picture(
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    CurrentUser(me): CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<UserView>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        if field.name() != Some(FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;
        upload = Some((content_type, bytes));
    }

    let Some((content_type, bytes)) = upload else {
        return Err(invalid("No file was submitted."));
    };

    let (format, extension) = check_upload(&config, content_type.as_deref(), &bytes)?;

    let relative = format!("profile_pics/user_{}_{}.{extension}", me.id, Uuid::now_v7().simple());
    save_square(bytes, format, config.media_root.join(&relative)).await?;

    let updated = match users::set_profile_picture(store.pool(), me.id, Some(&relative)).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            remove_media(&config, &relative).await;
            return Err(AppError::NotFound);
        }
        Err(err) => {
            remove_media(&config, &relative).await;
            return Err(err.into());
        }
    };

    if let Some(previous) = &me.profile_picture {
        remove_media(&config, previous).await;
    }

    tracing::info!(user_id = me.id, path = %relative, "profile picture replaced");
    Ok(Json(UserView::from(&updated)))
}

/// MIME type, then size, then pixel dimensions.
pub(crate) fn check_upload(
    config: &Config,
    content_type: Option<&str>,
    bytes: &[u8],
) -> AppResult<(ImageFormat, &'static str)> {
    let Some(&(_, format, extension)) = ACCEPTED
        .iter()
        .find(|(mime, ..)| Some(*mime) == content_type)
    else {
        return Err(invalid("File must be a JPEG or PNG image."));
    };

    if bytes.len() > config.avatar_max_bytes {
        return Err(invalid(format!(
            "Image file too large ( > {} bytes ).",
            config.avatar_max_bytes
        )));
    }

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|_| corrupt())?;

    let bound = config.avatar_max_dimension;
    if width > bound || height > bound {
        return Err(invalid(format!(
            "Image dimensions should not be greater than {bound}x{bound} pixels."
        )));
    }

    Ok((format, extension))
}

pub(crate) fn crop_to_square(img: DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    if width == height {
        return img;
    }

    let size = width.min(height);
    img.crop_imm((width - size) / 2, (height - size) / 2, size, size)
}

async fn save_square(bytes: Bytes, format: ImageFormat, target: PathBuf) -> AppResult<()> {
    tokio::task::spawn_blocking(move || -> AppResult<()> {
        let img = image::load_from_memory_with_format(&bytes, format).map_err(|_| corrupt())?;
        if let Some(dir) = target.parent() {
            std::fs::create_dir_all(dir)?;
        }
        crop_to_square(img).save_with_format(&target, format)?;
        Ok(())
    })
    .await?
}

/// Best effort: a missing file is only logged.
pub(crate) async fn remove_media(config: &Config, relative: &str) {
    let path = config.media_root.join(relative);
    if let Err(err) = tokio::fs::remove_file(&path).await {
        tracing::warn!(path = %path.display(), %err, "could not remove media file");
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(FieldErrors::single(FIELD, message))
}

fn corrupt() -> AppError {
    invalid("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")
}
