//! Curated prompt-technique examples shown in the guide panel.  Each entry
//! pairs a reusable template with a worked example; selecting one replaces
//! the prompt text wholesale.

/// One guide entry.
pub struct PromptExample {
    pub title: &'static str,
    pub template: &'static str,
    pub prompt: &'static str,
}

pub fn generation_prompts() -> &'static [PromptExample] {
    GENERATION_PROMPTS
}

pub fn editing_prompts() -> &'static [PromptExample] {
    EDITING_PROMPTS
}

static GENERATION_PROMPTS: &[PromptExample] = &[
    PromptExample {
        title: "Photorealistic scenes",
        template: "A photorealistic [shot type] of [subject], [action or expression], set in \
                   [environment]. The scene is illuminated by [lighting description], creating \
                   a [mood] atmosphere. Captured with a [camera/lens details], emphasizing \
                   [key textures and details].",
        prompt: "A photorealistic close-up portrait of an elderly Japanese potter, his hands \
                 covered in clay, concentrating on a piece in his workshop. Warm, soft window \
                 light accentuates the wrinkles of his face and the texture of the pottery, \
                 creating a peaceful, meditative atmosphere. Shot with a 50mm prime lens for a \
                 shallow depth of field.",
    },
    PromptExample {
        title: "Stylized illustrations & stickers",
        template: "A [style] sticker of a [subject], featuring [key characteristics] and a \
                   [color palette]. The design should have [line style] and [shading style]. \
                   The background must be transparent.",
        prompt: "A cute chibi-style sticker of a happy red panda with big sparkling eyes and a \
                 fluffy tail, using a pastel orange, cream and dark brown color palette. Bold \
                 clean outlines with soft cel shading; the background must be transparent.",
    },
    PromptExample {
        title: "Accurate text in images",
        template: "Create a [image type] for [brand/concept] with the text \"[text to render]\" \
                   in a [font style]. The design should be [style description], with a \
                   [color scheme].",
        prompt: "Create a modern, minimalist logo for a coffee shop called 'The Daily Grind'. \
                 The text should be set in a sleek sans-serif font. The design features a \
                 simple coffee cup icon inside a brown circle, using an earthy color scheme of \
                 dark brown, beige and white.",
    },
    PromptExample {
        title: "Product mockups & commercial shots",
        template: "A high-resolution, studio-lit product photograph of a [product description] \
                   on a [background surface/description]. The lighting is a [lighting setup] \
                   to [lighting purpose]. The camera angle is a [angle type] to showcase \
                   [specific feature].",
        prompt: "A high-resolution, studio-lit product photograph of a minimalist ceramic \
                 coffee mug on a matte white background. Three-point softbox lighting gives \
                 soft, even illumination and minimal shadows. The camera is set at a slightly \
                 elevated angle to show off the mug's handle and texture. Tack-sharp focus.",
    },
    PromptExample {
        title: "Minimalism & negative space",
        template: "A minimalist composition featuring a single [subject] positioned in the \
                   [bottom-right/top-left/etc.] of the frame. The background is a vast, empty \
                   [color] canvas, creating significant negative space. Soft, subtle lighting.",
        prompt: "A minimalist composition featuring a single delicate maple leaf positioned in \
                 the bottom-right of the frame. The background is a vast, empty cream-colored \
                 canvas, creating significant negative space. Soft, subtle lighting highlights \
                 the veins of the leaf.",
    },
    PromptExample {
        title: "Sequential art (comic panels)",
        template: "A single comic book panel in a [art style] style. In the foreground, \
                   [character description and action]. In the background, [setting details]. \
                   The panel has a [dialogue/caption box] with the text \"[Text]\".",
        prompt: "A single comic book panel in a gritty noir art style. In the foreground, a \
                 weary detective in a trench coat smokes a cigarette on a rainy city street. \
                 In the background, neon signs reflect off the wet asphalt. A caption box at \
                 the top reads \"The city never slept, but I wanted to.\"",
    },
];

static EDITING_PROMPTS: &[PromptExample] = &[
    PromptExample {
        title: "Adding & removing elements",
        template: "Using the provided image of [subject], please [add/remove/modify] [element] \
                   to/from the scene. Ensure the change is [description of how the change \
                   should integrate].",
        prompt: "Using the provided image of the cat, add a small knitted wizard hat. The hat \
                 should sit naturally on the cat's head, with lighting and shadows matching \
                 the original photo.",
    },
    PromptExample {
        title: "Inpainting (semantic masking)",
        template: "Using the provided image, change only the [specific element] to [new \
                   element/description]. Keep everything else in the image exactly the same.",
        prompt: "Using the provided living-room image, change only the blue sofa to a vintage \
                 brown leather chesterfield. Keep the rest of the room, the lighting and the \
                 shadows exactly the same.",
    },
    PromptExample {
        title: "Style transfer",
        template: "Transform the provided photograph of [subject] into the artistic style of \
                   [artist/art style]. Preserve the original composition but render it with \
                   [description of stylistic elements].",
        prompt: "Transform the provided night-time photograph of a modern city street into the \
                 style of Van Gogh. Preserve the original composition, but render it with \
                 swirling brushstrokes and a vivid color palette.",
    },
    PromptExample {
        title: "Advanced composition",
        template: "Create a new image by combining the elements from the provided images. Take \
                   the [element from image 1] and place it with/on the [element from image 2].",
        prompt: "Create a professional e-commerce fashion photo. Using the image of the female \
                 model and the image of the dress, make it look like the model is wearing the \
                 dress. The final image should look realistic against a white background.",
    },
    PromptExample {
        title: "High-fidelity detail preservation",
        template: "Using the provided images, place [element from image 2] onto [element from \
                   image 1]. Ensure that the features of [element from image 1] remain \
                   completely unchanged.",
        prompt: "Take the first image of the woman with brown hair, blue eyes and a neutral \
                 expression. Using the second image with the logo, add that logo to her shirt. \
                 Do not change the woman's facial features, hair or expression in any way.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_guides_have_entries_with_usable_prompts() {
        for example in generation_prompts().iter().chain(editing_prompts()) {
            assert!(!example.title.is_empty());
            assert!(!example.template.is_empty());
            assert!(!example.prompt.trim().is_empty());
        }
        assert_eq!(generation_prompts().len(), 6);
        assert_eq!(editing_prompts().len(), 5);
    }
}
